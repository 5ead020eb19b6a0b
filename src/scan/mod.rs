//! 目录扫描机制：枚举、排除策略、计数预扫与分阶段遍历。

pub mod count;
pub mod enumerate;
pub mod exclude;
pub mod walker;

pub use count::count_directories;
pub use enumerate::{read_children, read_children_soft, read_children_sync};
pub use exclude::should_exclude;
pub use walker::{bounded_scan, full_scan};

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 扫描节奏参数。批量/间隔大小直接决定宿主事件循环的响应性，
/// 调小会让遍历显著变慢，调大会在大目录树上饿死其它任务。
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// 有界扫描的最大深度（该深度上的目录只列出、不展开）
    pub max_depth: usize,
    /// 有界扫描每处理多少个条目让出一次事件循环
    pub batch_size: usize,
    /// 全量扫描每访问多少个目录上报一次进度
    pub progress_interval: u64,
    /// 全量扫描每访问多少个目录让出一次事件循环
    pub yield_interval: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: 2,
            batch_size: 20,
            progress_interval: 10,
            yield_interval: 50,
        }
    }
}

/// 每次 open_root 配一个令牌；新的打开会取消旧扫描，
/// 遍历在每个让出点检查并提前退出。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub enum ScanError {
    RootNotFound(PathBuf),
    NotADirectory(PathBuf),
    Io(io::Error),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::RootNotFound(path) => {
                write!(f, "root does not exist: {}", path.display())
            }
            ScanError::NotADirectory(path) => {
                write!(f, "root is not a directory: {}", path.display())
            }
            ScanError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ScanError {
    fn from(err: io::Error) -> Self {
        ScanError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_default_options() {
        let opts = ScanOptions::default();
        assert_eq!(opts.max_depth, 2);
        assert_eq!(opts.batch_size, 20);
        assert_eq!(opts.progress_interval, 10);
        assert_eq!(opts.yield_interval, 50);
    }
}
