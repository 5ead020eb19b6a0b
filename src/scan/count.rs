use crate::scan::{should_exclude, CancelToken, ScanOptions};
use std::io;
use std::path::{Path, PathBuf};
use tokio::task::yield_now;

/// 统计全量扫描将要访问的目录数（含根目录本身）。
///
/// 排除策略、容错行为与随后的遍历完全一致，进度分母才对得上。
/// 预扫重复了一部分遍历成本，换来精确的百分比。
/// 返回 `Ok(None)` 表示扫描已被取消。
pub async fn count_directories(
    root: &Path,
    opts: &ScanOptions,
    cancel: &CancelToken,
) -> io::Result<Option<u64>> {
    let mut count: u64 = 1;
    let mut stack = list_subdirs(root).await?;

    while let Some(dir) = stack.pop() {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        count += 1;
        // 单个子目录读不动就当它没有下级，继续数别处
        if let Ok(subdirs) = list_subdirs(&dir).await {
            stack.extend(subdirs);
        }
        if count % opts.yield_interval == 0 {
            yield_now().await;
        }
    }

    Ok(Some(count))
}

async fn list_subdirs(path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut dirs = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }
        if should_exclude(&entry.file_name().to_string_lossy()) {
            continue;
        }
        dirs.push(entry.path());
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_counts_root_and_descendants() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::create_dir(dir.path().join("c")).unwrap();
        File::create(dir.path().join("a/file.txt")).unwrap();

        let count = count_directories(dir.path(), &ScanOptions::default(), &CancelToken::new())
            .await
            .unwrap();
        // 根 + a + a/b + c
        assert_eq!(count, Some(4));
    }

    #[tokio::test]
    async fn test_excluded_dirs_are_not_counted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();

        let count = count_directories(dir.path(), &ScanOptions::default(), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(count, Some(2));
    }

    #[tokio::test]
    async fn test_cancelled_count_returns_none() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();

        let token = CancelToken::new();
        token.cancel();
        let count = count_directories(dir.path(), &ScanOptions::default(), &token)
            .await
            .unwrap();
        assert_eq!(count, None);
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("missing");
        let result = count_directories(&gone, &ScanOptions::default(), &CancelToken::new()).await;
        assert!(result.is_err());
    }
}
