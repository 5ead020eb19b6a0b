//! 分阶段加载调度。
//!
//! open_root 同步返回 level-0 结果，随后同一个后台任务依次推进
//! 有界扫描、计数预扫与全量扫描，逐阶段经事件通道整树下发。
//! 每次 open 配一个单调递增的 generation，新的打开作废旧扫描。

use crate::events::TreeEvent;
use crate::models::FolderStructure;
use crate::persist::StateStore;
use crate::scan::{
    bounded_scan, count_directories, full_scan, read_children_sync, CancelToken, ScanError,
    ScanOptions,
};
use crate::session::{SessionHandle, TreeSession};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Mutex;
use tracing::{debug, error, info};

pub struct TreeLoader {
    runtime: tokio::runtime::Runtime,
    tx: Sender<TreeEvent>,
    next_generation: AtomicU64,
    active_scan: Mutex<Option<CancelToken>>,
    options: ScanOptions,
    store: Option<StateStore>,
}

impl TreeLoader {
    pub fn new(tx: Sender<TreeEvent>) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("failed to create tokio runtime");
        Self {
            runtime,
            tx,
            next_generation: AtomicU64::new(0),
            active_scan: Mutex::new(None),
            options: ScanOptions::default(),
            store: None,
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// 每个阶段结束把当前快照写进去，重启后能立即还原上次的树。
    pub fn with_store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn tokio_handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    /// 打开根目录。level-0 扫描同步完成并体现在返回的会话里，
    /// 深层扫描作为后台任务继续推进。根路径本身无效时直接报错，
    /// 不启动任何后台阶段。
    pub fn open_root(&self, path: &Path) -> Result<TreeSession, ScanError> {
        let meta = std::fs::metadata(path)
            .map_err(|_| ScanError::RootNotFound(path.to_path_buf()))?;
        if !meta.is_dir() {
            return Err(ScanError::NotADirectory(path.to_path_buf()));
        }
        let root = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = CancelToken::new();
        {
            let mut active = self
                .active_scan
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if let Some(previous) = active.replace(cancel.clone()) {
                previous.cancel();
            }
        }

        let tree = read_children_sync(&root, 0, false)?;
        let structure = FolderStructure::new(root.clone(), tree);
        if let Some(store) = &self.store {
            store.save(&structure);
        }

        let session = TreeSession::new(structure.clone(), generation, cancel.clone());
        info!(root = %root.display(), generation, entries = structure.tree.len(), "root opened");

        let _ = self.tx.send(TreeEvent::Initial {
            generation,
            root_path: root.clone(),
            structure,
        });

        self.runtime.spawn(run_staged(StagedScan {
            root,
            generation,
            options: self.options.clone(),
            cancel,
            tx: self.tx.clone(),
            store: self.store.clone(),
            session: session.shared_handle(),
        }));

        Ok(session)
    }

    /// 对已打开的根重走一遍完整分阶段序列。不做增量 diff，整树替换。
    pub fn refresh_root(&self, path: &Path) -> Result<TreeSession, ScanError> {
        self.open_root(path)
    }
}

struct StagedScan {
    root: PathBuf,
    generation: u64,
    options: ScanOptions,
    cancel: CancelToken,
    tx: Sender<TreeEvent>,
    store: Option<StateStore>,
    session: SessionHandle,
}

impl StagedScan {
    fn save(&self, structure: &FolderStructure) {
        if let Some(store) = &self.store {
            store.save(structure);
        }
    }

    /// 致命失败：保留最后一棵好树、落地失败标记、上报错误事件。
    fn fail(&self, stage: &'static str, err: io::Error) {
        let structure = self.session.mark_failed();
        self.save(&structure);
        error!(
            root = %self.root.display(),
            generation = self.generation,
            stage,
            error = %err,
            "background scan failed"
        );
        let _ = self.tx.send(TreeEvent::Error {
            generation: self.generation,
            root_path: self.root.clone(),
            error: err.to_string(),
        });
    }
}

async fn run_staged(scan: StagedScan) {
    // 阶段二：有界深度扫描
    let bounded = match bounded_scan(&scan.root, &scan.options, &scan.cancel).await {
        Ok(Some(tree)) => tree,
        Ok(None) => return,
        Err(err) => {
            scan.fail("bounded", err);
            return;
        }
    };
    let structure = scan.session.replace_tree(bounded);
    scan.save(&structure);
    let _ = scan.tx.send(TreeEvent::Bounded {
        generation: scan.generation,
        root_path: scan.root.clone(),
        structure,
    });

    // 阶段三：计数预扫定进度分母
    let total = match count_directories(&scan.root, &scan.options, &scan.cancel).await {
        Ok(Some(total)) => total,
        Ok(None) => return,
        Err(err) => {
            scan.fail("count", err);
            return;
        }
    };
    debug!(root = %scan.root.display(), total, "directory count settled");

    // 阶段四：全量后台扫描
    let progress_tx = scan.tx.clone();
    let progress_root = scan.root.clone();
    let generation = scan.generation;
    let on_progress = move |progress| {
        let _ = progress_tx.send(TreeEvent::Progress {
            generation,
            root_path: progress_root.clone(),
            progress,
        });
    };
    match full_scan(&scan.root, total, &scan.options, &scan.cancel, on_progress).await {
        Ok(Some(tree)) => {
            let structure = scan.session.complete(tree);
            scan.save(&structure);
            info!(
                root = %scan.root.display(),
                generation = scan.generation,
                "background scan complete"
            );
            let _ = scan.tx.send(TreeEvent::Complete {
                generation: scan.generation,
                root_path: scan.root.clone(),
                structure,
            });
        }
        Ok(None) => {
            debug!(root = %scan.root.display(), generation = scan.generation, "scan superseded");
        }
        Err(err) => scan.fail("full", err),
    }
}
