//! 单层目录枚举。
//!
//! 异步版供后台遍历与懒加载用，同步版供 level-0 快速路径用。
//! 枚举器自身不管根路径合法性，由调用方决定失败是否致命。

use crate::models::{sort_nodes, TreeNode};
use crate::scan::should_exclude;
use std::io;
use std::path::Path;
use tracing::warn;

/// 列出一层子节点，目录在前、组内有序。`level` 由调用方指定。
/// `apply_exclusions` 只在深层遍历（全量扫描/计数预扫）时为 true。
pub async fn read_children(
    path: &Path,
    level: usize,
    apply_exclusions: bool,
) -> io::Result<Vec<TreeNode>> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut nodes = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        let name = entry.file_name();
        let is_dir = file_type.is_dir();
        if apply_exclusions && is_dir && should_exclude(&name.to_string_lossy()) {
            continue;
        }
        nodes.push(TreeNode::new(&name, path, is_dir, level));
    }
    sort_nodes(&mut nodes);
    Ok(nodes)
}

/// 读失败按空目录处理并继续，单个不可读子树不应中断整体遍历。
pub async fn read_children_soft(path: &Path, level: usize, apply_exclusions: bool) -> Vec<TreeNode> {
    match read_children(path, level, apply_exclusions).await {
        Ok(nodes) => nodes,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "directory read failed, treating as empty");
            Vec::new()
        }
    }
}

/// 同步单层枚举，open_root 的 level-0 快速路径。
pub fn read_children_sync(
    path: &Path,
    level: usize,
    apply_exclusions: bool,
) -> io::Result<Vec<TreeNode>> {
    let mut nodes = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let Ok(entry) = entry else {
            continue;
        };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let name = entry.file_name();
        let is_dir = file_type.is_dir();
        if apply_exclusions && is_dir && should_exclude(&name.to_string_lossy()) {
            continue;
        }
        nodes.push(TreeNode::new(&name, path, is_dir, level));
    }
    sort_nodes(&mut nodes);
    Ok(nodes)
}
