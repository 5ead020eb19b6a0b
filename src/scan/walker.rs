//! 分阶段目录遍历：有界深度扫描与全量后台扫描。
//!
//! 两者都用显式工作队列配扁平 slot 场地，不做函数递归，
//! 深树不会涨调用栈，让出点也一目了然。

use crate::models::{ProgressSnapshot, TreeNode};
use crate::scan::enumerate::{read_children, read_children_soft};
use crate::scan::{CancelToken, ScanOptions};
use std::collections::VecDeque;
use std::io;
use std::path::Path;
use tokio::task::yield_now;
use tracing::debug;

struct Slot {
    node: TreeNode,
    children: Vec<usize>,
}

/// 父节点总在子节点之前入场，倒序一遍即可把扁平场地装配回嵌套树。
/// 前 `top` 个 slot 是根的直接子节点，顺序即最终顺序。
fn materialize(arena: Vec<Slot>, top: usize) -> Vec<TreeNode> {
    let len = arena.len();
    let mut slots: Vec<Option<Slot>> = arena.into_iter().map(Some).collect();
    let mut built: Vec<Option<TreeNode>> = Vec::new();
    built.resize_with(len, || None);

    for i in (0..len).rev() {
        let Some(slot) = slots[i].take() else {
            continue;
        };
        let Slot { mut node, children } = slot;
        node.children = children
            .into_iter()
            .filter_map(|c| built.get_mut(c).and_then(Option::take))
            .collect();
        built[i] = Some(node);
    }

    built.truncate(top);
    built.into_iter().flatten().collect()
}

/// 有界深度扫描：深度小于 `max_depth` 的目录全部展开，
/// 恰好在 `max_depth` 上的只列出不展开，留给懒加载或全量扫描。
/// 不应用排除策略。每处理 `batch_size` 个条目让出一次事件循环。
/// 根目录读失败对本阶段是致命的；返回 `Ok(None)` 表示扫描被取消。
pub async fn bounded_scan(
    root: &Path,
    opts: &ScanOptions,
    cancel: &CancelToken,
) -> io::Result<Option<Vec<TreeNode>>> {
    let top_nodes = read_children(root, 0, false).await?;
    let top = top_nodes.len();

    let mut arena: Vec<Slot> = Vec::new();
    let mut queue: VecDeque<usize> = VecDeque::new();
    for node in top_nodes {
        let expand = node.is_directory && node.level < opts.max_depth;
        arena.push(Slot {
            node,
            children: Vec::new(),
        });
        if expand {
            queue.push_back(arena.len() - 1);
        }
    }

    let mut entries_in_batch = top;
    while let Some(idx) = queue.pop_front() {
        if cancel.is_cancelled() {
            debug!(root = %root.display(), "bounded scan superseded, stopping");
            return Ok(None);
        }

        let path = arena[idx].node.path.clone();
        let child_level = arena[idx].node.level + 1;
        let children = read_children_soft(&path, child_level, false).await;
        arena[idx].node.children_loaded = true;

        entries_in_batch += children.len();
        for child in children {
            let expand = child.is_directory && child.level < opts.max_depth;
            arena.push(Slot {
                node: child,
                children: Vec::new(),
            });
            let cidx = arena.len() - 1;
            arena[idx].children.push(cidx);
            if expand {
                queue.push_back(cidx);
            }
        }

        if entries_in_batch >= opts.batch_size {
            entries_in_batch = 0;
            yield_now().await;
        }
    }

    Ok(Some(materialize(arena, top)))
}

/// 全量后台扫描：应用排除策略，访问每一个未被排除的目录。
/// 每访问 `progress_interval` 个目录上报一次进度，结束时无条件再报一次；
/// 每访问 `yield_interval` 个目录让出一次事件循环。
/// 根目录读失败致命，子目录读失败按空目录吸收。
pub async fn full_scan(
    root: &Path,
    total_directories: u64,
    opts: &ScanOptions,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(ProgressSnapshot),
) -> io::Result<Option<Vec<TreeNode>>> {
    let top_nodes = read_children(root, 0, true).await?;
    let top = top_nodes.len();

    let mut arena: Vec<Slot> = Vec::new();
    let mut queue: VecDeque<usize> = VecDeque::new();
    for node in top_nodes {
        let is_dir = node.is_directory;
        arena.push(Slot {
            node,
            children: Vec::new(),
        });
        if is_dir {
            queue.push_back(arena.len() - 1);
        }
    }

    let mut visited: u64 = 1;
    while let Some(idx) = queue.pop_front() {
        if cancel.is_cancelled() {
            debug!(root = %root.display(), "full scan superseded, stopping");
            return Ok(None);
        }

        let path = arena[idx].node.path.clone();
        let child_level = arena[idx].node.level + 1;
        let children = read_children_soft(&path, child_level, true).await;
        arena[idx].node.children_loaded = true;

        for child in children {
            let is_dir = child.is_directory;
            arena.push(Slot {
                node: child,
                children: Vec::new(),
            });
            let cidx = arena.len() - 1;
            arena[idx].children.push(cidx);
            if is_dir {
                queue.push_back(cidx);
            }
        }

        visited += 1;
        if visited % opts.progress_interval == 0 {
            on_progress(ProgressSnapshot {
                total_directories,
                loaded_directories: visited,
                current_path: path,
                is_complete: visited == total_directories,
            });
        }
        if visited % opts.yield_interval == 0 {
            yield_now().await;
        }
    }

    on_progress(ProgressSnapshot {
        total_directories,
        loaded_directories: visited,
        current_path: root.to_path_buf(),
        is_complete: true,
    });

    Ok(Some(materialize(arena, top)))
}
