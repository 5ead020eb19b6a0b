//! 最近打开目录的持久化记录。
//!
//! 每个扫描阶段结束写一次，重启后可先展示上次的树，再重新扫描。
//! 读写失败都只降级为告警，持久化永远不阻塞加载本身。

use crate::models::FolderStructure;
use std::path::{Path, PathBuf};
use tracing::warn;

const STATE_DIR: &str = ".ztree";
const STATE_FILE: &str = "last_folder.json";

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// 指定目录存放记录文件，测试与嵌入方用。
    pub fn at(dir: &Path) -> Self {
        Self {
            path: dir.join(STATE_FILE),
        }
    }

    /// 默认放在各平台的缓存目录下。
    pub fn default_location() -> Option<Self> {
        cache_dir().map(|dir| Self {
            path: dir.join(STATE_DIR).join(STATE_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, structure: &FolderStructure) {
        let json = match serde_json::to_string_pretty(structure) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to serialize folder state");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    warn!(error = %err, "failed to create state directory");
                    return;
                }
            }
        }
        if let Err(err) = std::fs::write(&self.path, json) {
            warn!(path = %self.path.display(), error = %err, "failed to persist folder state");
        }
    }

    pub fn load(&self) -> Option<FolderStructure> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&data).ok()
    }
}

pub(crate) fn cache_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Caches"));
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
            return Some(PathBuf::from(xdg));
        }
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".cache"));
    }

    #[cfg(target_os = "windows")]
    {
        return std::env::var("LOCALAPPDATA").ok().map(PathBuf::from);
    }

    #[allow(unreachable_code)]
    None
}
