//! ztree - 编辑器文件树后台加载库
//!
//! 模块结构：
//! - models: 数据模型（TreeNode, FolderStructure, ProgressSnapshot）
//! - scan: 扫描机制（枚举、排除策略、计数预扫、分阶段遍历）
//! - loader / session: 调度与会话句柄（open_root / expand_node）
//! - events: 树更新通道（TreeEvent）
//! - persist: 最近打开目录的持久化
//! - logging: tracing 初始化（仅驱动二进制使用）

pub mod events;
pub mod loader;
pub mod logging;
pub mod models;
pub mod persist;
pub mod scan;
pub mod session;

pub use events::TreeEvent;
pub use loader::TreeLoader;
pub use models::{FolderStructure, ProgressSnapshot, TreeNode};
pub use persist::StateStore;
pub use scan::{CancelToken, ScanError, ScanOptions};
pub use session::TreeSession;
