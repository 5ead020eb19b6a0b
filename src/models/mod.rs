//! 数据模型层

pub mod progress;
pub mod tree;

pub use progress::ProgressSnapshot;
pub use tree::{compare_nodes, sort_nodes, FolderStructure, TreeNode};
