//! 每次打开根目录得到一个会话句柄。
//!
//! 快照归调用方所有，不存在进程级可变的"当前目录"单例；
//! 各阶段整树替换，懒加载就地补层。

use crate::models::{FolderStructure, TreeNode};
use crate::scan::{read_children, CancelToken};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

pub struct TreeSession {
    shared: Arc<SessionShared>,
}

pub(crate) type SessionHandle = Arc<SessionShared>;

pub(crate) struct SessionShared {
    root: PathBuf,
    generation: u64,
    cancel: CancelToken,
    current: Mutex<FolderStructure>,
    loading: Mutex<FxHashSet<PathBuf>>,
}

impl TreeSession {
    pub(crate) fn new(structure: FolderStructure, generation: u64, cancel: CancelToken) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                root: structure.root.clone(),
                generation,
                cancel,
                current: Mutex::new(structure),
                loading: Mutex::new(FxHashSet::default()),
            }),
        }
    }

    pub(crate) fn shared_handle(&self) -> SessionHandle {
        Arc::clone(&self.shared)
    }

    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    pub fn generation(&self) -> u64 {
        self.shared.generation
    }

    /// 当前快照的完整拷贝。
    pub fn snapshot(&self) -> FolderStructure {
        self.shared.lock_current().clone()
    }

    pub fn is_background_loading(&self) -> bool {
        self.shared.lock_current().background_loading
    }

    /// 指定路径的懒加载是否在途（UI 据此画加载指示）。
    pub fn is_loading(&self, path: &Path) -> bool {
        self.shared.lock_loading().contains(path)
    }

    /// 作废本次扫描。通常不必手动调用，下一次 open_root 会代劳。
    pub fn cancel(&self) {
        self.shared.cancel.cancel();
    }

    /// 懒加载：为后台还没扫到的目录节点就地补一层子节点。
    ///
    /// 不应用排除策略（与有界扫描口径一致），读失败按空目录处理。
    /// 若读盘期间某个阶段快照已覆盖该节点，以快照为准，丢弃本次结果。
    pub async fn expand_node(&self, path: &Path) -> Vec<TreeNode> {
        let level = {
            let mut current = self.shared.lock_current();
            match current.find_node_mut(path) {
                Some(node) if node.children_loaded => {
                    return node.children.clone();
                }
                Some(node) => {
                    node.is_loading = true;
                    node.level + 1
                }
                None => {
                    debug!(path = %path.display(), "expand target not in current snapshot");
                    path.strip_prefix(&self.shared.root)
                        .map(|rel| rel.components().count())
                        .unwrap_or(0)
                }
            }
        };
        self.shared.lock_loading().insert(path.to_path_buf());

        let children = match read_children(path, level, false).await {
            Ok(children) => children,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "lazy expand failed, treating as empty");
                Vec::new()
            }
        };

        self.shared.lock_loading().remove(path);

        let mut current = self.shared.lock_current();
        match current.find_node_mut(path) {
            Some(node) if node.children_loaded => node.children.clone(),
            Some(node) => {
                node.children = children.clone();
                node.children_loaded = true;
                node.is_loading = false;
                children
            }
            None => children,
        }
    }

    /// 外部结构性编辑：新条目插入当前快照，保持排序。
    pub fn apply_created(&self, path: &Path, is_dir: bool) -> bool {
        self.shared.lock_current().insert_path(path, is_dir)
    }

    pub fn apply_deleted(&self, path: &Path) -> bool {
        self.shared.lock_current().remove_path(path)
    }

    pub fn apply_renamed(&self, from: &Path, to: &Path) -> bool {
        self.shared.lock_current().rename_path(from, to)
    }
}

impl SessionShared {
    fn lock_current(&self) -> MutexGuard<'_, FolderStructure> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_loading(&self) -> MutexGuard<'_, FxHashSet<PathBuf>> {
        self.loading.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 有界扫描结果：整树替换，后台加载继续。
    pub(crate) fn replace_tree(&self, tree: Vec<TreeNode>) -> FolderStructure {
        let mut current = self.lock_current();
        current.tree = tree;
        current.background_loading = true;
        current.background_loading_failed = false;
        current.clone()
    }

    /// 全量扫描完成：整树替换，后台加载收尾。
    pub(crate) fn complete(&self, tree: Vec<TreeNode>) -> FolderStructure {
        let mut current = self.lock_current();
        current.tree = tree;
        current.background_loading = false;
        current.background_loading_failed = false;
        current.clone()
    }

    /// 后台扫描致命失败：保留最后一棵好树，打上失败标记。
    pub(crate) fn mark_failed(&self) -> FolderStructure {
        let mut current = self.lock_current();
        current.background_loading = false;
        current.background_loading_failed = true;
        current.clone()
    }
}
