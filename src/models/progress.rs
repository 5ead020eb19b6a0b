use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 全量后台扫描的进度快照。每次全量扫描重新计算，不持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub total_directories: u64,
    pub loaded_directories: u64,
    pub current_path: PathBuf,
    pub is_complete: bool,
}

impl ProgressSnapshot {
    pub fn percent(&self) -> u8 {
        if self.total_directories == 0 {
            return 100;
        }
        let pct = self.loaded_directories.saturating_mul(100) / self.total_directories;
        pct.min(100) as u8
    }
}
