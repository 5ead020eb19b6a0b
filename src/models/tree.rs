//! 文件树快照模型
//!
//! 每个扫描阶段产出一棵完整的快照树，整树替换、不做合并。
//! 节点以绝对路径作为唯一标识。

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// 单个文件系统条目。文件的 `children_loaded` 恒为 true（无子节点可载）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub name: CompactString,
    pub path: PathBuf,
    pub parent_path: PathBuf,
    pub is_directory: bool,
    #[serde(default)]
    pub children: Vec<TreeNode>,
    #[serde(default)]
    pub children_loaded: bool,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default)]
    pub is_expanded: bool,
    #[serde(default)]
    pub level: usize,
}

impl TreeNode {
    pub fn new(name: &OsStr, parent_path: &Path, is_directory: bool, level: usize) -> Self {
        Self {
            name: CompactString::new(name.to_string_lossy()),
            path: parent_path.join(name),
            parent_path: parent_path.to_path_buf(),
            is_directory,
            children: Vec::new(),
            children_loaded: !is_directory,
            is_loading: false,
            is_expanded: false,
            level,
        }
    }
}

/// 目录在前、文件在后；组内按名称忽略大小写升序，
/// 同名时再按原始大小写比较，保证全序确定。
pub fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    match (a.is_directory, b.is_directory) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    }
}

pub fn sort_nodes(nodes: &mut [TreeNode]) {
    nodes.sort_by(compare_nodes);
}

/// 某个根目录当前的整棵快照。后台扫描每推进一个阶段就整体替换一次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderStructure {
    pub name: String,
    pub root: PathBuf,
    pub tree: Vec<TreeNode>,
    #[serde(default)]
    pub background_loading: bool,
    #[serde(default)]
    pub background_loading_failed: bool,
}

impl FolderStructure {
    pub fn new(root: PathBuf, tree: Vec<TreeNode>) -> Self {
        let name = root
            .file_name()
            .or_else(|| root.iter().next_back())
            .unwrap_or(root.as_os_str())
            .to_string_lossy()
            .into_owned();
        Self {
            name,
            root,
            tree,
            background_loading: true,
            background_loading_failed: false,
        }
    }

    pub fn find_node(&self, path: &Path) -> Option<&TreeNode> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut nodes = self.tree.as_slice();
        let mut found = None;
        for component in relative.components() {
            let name = component.as_os_str();
            let node = nodes.iter().find(|n| n.path.file_name() == Some(name))?;
            nodes = node.children.as_slice();
            found = Some(node);
        }
        found
    }

    pub fn find_node_mut(&mut self, path: &Path) -> Option<&mut TreeNode> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let components: Vec<&OsStr> = relative.components().map(|c| c.as_os_str()).collect();
        let mut nodes = &mut self.tree;
        for (i, name) in components.iter().enumerate() {
            let idx = nodes
                .iter()
                .position(|n| n.path.file_name() == Some(*name))?;
            if i == components.len() - 1 {
                return Some(&mut nodes[idx]);
            }
            nodes = &mut nodes[idx].children;
        }
        None
    }

    /// 外部创建了新条目（用户操作、监听回调）：插入并保持排序。
    pub fn insert_path(&mut self, path: &Path, is_dir: bool) -> bool {
        let Some(parent) = path.parent() else {
            return false;
        };
        let Some(name) = path.file_name() else {
            return false;
        };

        let (nodes, level) = if parent == self.root {
            (&mut self.tree, 0)
        } else {
            let Some(node) = self.find_node_mut(parent) else {
                return false;
            };
            if !node.is_directory {
                return false;
            }
            let level = node.level + 1;
            (&mut node.children, level)
        };

        if nodes.iter().any(|n| n.path == path) {
            return false;
        }
        nodes.push(TreeNode::new(name, parent, is_dir, level));
        sort_nodes(nodes);
        true
    }

    pub fn remove_path(&mut self, path: &Path) -> bool {
        let Some(parent) = path.parent() else {
            return false;
        };
        let nodes = if parent == self.root {
            &mut self.tree
        } else {
            match self.find_node_mut(parent) {
                Some(n) => &mut n.children,
                None => return false,
            }
        };
        let before = nodes.len();
        nodes.retain(|n| n.path != path);
        nodes.len() != before
    }

    pub fn rename_path(&mut self, from: &Path, to: &Path) -> bool {
        if from == to {
            return false;
        }
        let Some(name) = to.file_name() else {
            return false;
        };

        let same_parent = from
            .parent()
            .zip(to.parent())
            .map(|(a, b)| a == b)
            .unwrap_or(false);

        if same_parent {
            let Some(parent) = from.parent() else {
                return false;
            };
            let nodes = if parent == self.root {
                &mut self.tree
            } else {
                match self.find_node_mut(parent) {
                    Some(n) => &mut n.children,
                    None => return false,
                }
            };
            let Some(node) = nodes.iter_mut().find(|n| n.path == from) else {
                return false;
            };
            node.name = CompactString::new(name.to_string_lossy());
            let parent_path = node.parent_path.clone();
            let level = node.level;
            rebase_subtree(node, &parent_path, level);
            sort_nodes(nodes);
            return true;
        }

        // 跨父目录：摘下整棵子树，改挂到新父节点下
        let taken = {
            let Some(old_parent) = from.parent() else {
                return false;
            };
            let nodes = if old_parent == self.root {
                &mut self.tree
            } else {
                match self.find_node_mut(old_parent) {
                    Some(n) => &mut n.children,
                    None => return false,
                }
            };
            let Some(idx) = nodes.iter().position(|n| n.path == from) else {
                return false;
            };
            nodes.remove(idx)
        };

        let Some(new_parent) = to.parent() else {
            return true;
        };
        let (nodes, level) = if new_parent == self.root {
            (&mut self.tree, 0)
        } else {
            match self.find_node_mut(new_parent) {
                Some(n) if n.is_directory => {
                    let level = n.level + 1;
                    (&mut n.children, level)
                }
                // 目标父节点尚未加载进快照：退化为删除
                _ => return true,
            }
        };

        let mut node = taken;
        node.name = CompactString::new(name.to_string_lossy());
        rebase_subtree(&mut node, new_parent, level);
        nodes.push(node);
        sort_nodes(nodes);
        true
    }
}

/// 重算整棵子树的 path/parent_path/level。显式栈，不递归。
fn rebase_subtree(root: &mut TreeNode, new_parent: &Path, level: usize) {
    root.parent_path = new_parent.to_path_buf();
    root.path = new_parent.join(root.name.as_str());
    root.level = level;

    let mut stack: Vec<&mut TreeNode> = vec![root];
    while let Some(node) = stack.pop() {
        let parent_path = node.path.clone();
        let child_level = node.level + 1;
        for child in node.children.iter_mut() {
            child.parent_path = parent_path.clone();
            child.path = parent_path.join(child.name.as_str());
            child.level = child_level;
            stack.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, parent: &Path, is_dir: bool, level: usize) -> TreeNode {
        TreeNode::new(OsStr::new(name), parent, is_dir, level)
    }

    fn fixture() -> FolderStructure {
        let root = PathBuf::from("/project");
        let mut src = node("src", &root, true, 0);
        src.children_loaded = true;
        src.children = vec![node("main.rs", &root.join("src"), false, 1)];
        let tree = vec![src, node("README.md", &root, false, 0)];
        FolderStructure::new(root, tree)
    }

    #[test]
    fn test_sort_dirs_first_then_case_insensitive() {
        let root = PathBuf::from("/r");
        let mut nodes = vec![
            node("b.txt", &root, false, 0),
            node("a.txt", &root, false, 0),
            node("Z", &root, true, 0),
            node("a", &root, true, 0),
        ];
        sort_nodes(&mut nodes);
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["a", "Z", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_sort_case_tiebreak_is_deterministic() {
        let root = PathBuf::from("/r");
        let mut nodes = vec![node("abc", &root, false, 0), node("ABC", &root, false, 0)];
        sort_nodes(&mut nodes);
        assert_eq!(nodes[0].name, "ABC");
        assert_eq!(nodes[1].name, "abc");
    }

    #[test]
    fn test_find_node() {
        let structure = fixture();
        let found = structure
            .find_node(Path::new("/project/src/main.rs"))
            .unwrap();
        assert_eq!(found.name, "main.rs");
        assert!(!found.is_directory);
        assert_eq!(found.level, 1);

        assert!(structure.find_node(Path::new("/project")).is_none());
        assert!(structure.find_node(Path::new("/project/missing")).is_none());
        assert!(structure.find_node(Path::new("/elsewhere/x")).is_none());
    }

    #[test]
    fn test_insert_keeps_sort_order() {
        let mut structure = fixture();
        assert!(structure.insert_path(Path::new("/project/AUTHORS"), false));
        let names: Vec<&str> = structure.tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["src", "AUTHORS", "README.md"]);

        // duplicate insert is a no-op
        assert!(!structure.insert_path(Path::new("/project/AUTHORS"), false));
    }

    #[test]
    fn test_insert_under_loaded_dir() {
        let mut structure = fixture();
        assert!(structure.insert_path(Path::new("/project/src/lib.rs"), false));
        let src = structure.find_node(Path::new("/project/src")).unwrap();
        let names: Vec<&str> = src.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["lib.rs", "main.rs"]);
        assert_eq!(src.children[0].level, 1);
    }

    #[test]
    fn test_remove_path() {
        let mut structure = fixture();
        assert!(structure.remove_path(Path::new("/project/src/main.rs")));
        assert!(structure
            .find_node(Path::new("/project/src/main.rs"))
            .is_none());
        assert!(!structure.remove_path(Path::new("/project/src/main.rs")));
    }

    #[test]
    fn test_rename_same_parent_rebases_subtree() {
        let mut structure = fixture();
        assert!(structure.rename_path(Path::new("/project/src"), Path::new("/project/lib")));

        let renamed = structure.find_node(Path::new("/project/lib")).unwrap();
        assert_eq!(renamed.name, "lib");
        assert_eq!(renamed.children[0].path, Path::new("/project/lib/main.rs"));
        assert_eq!(renamed.children[0].parent_path, Path::new("/project/lib"));
    }

    #[test]
    fn test_rename_across_parents_moves_subtree() {
        let mut structure = fixture();
        assert!(structure.insert_path(Path::new("/project/docs"), true));
        structure
            .find_node_mut(Path::new("/project/docs"))
            .unwrap()
            .children_loaded = true;

        assert!(structure.rename_path(
            Path::new("/project/src/main.rs"),
            Path::new("/project/docs/main.rs")
        ));
        assert!(structure
            .find_node(Path::new("/project/src/main.rs"))
            .is_none());
        let moved = structure
            .find_node(Path::new("/project/docs/main.rs"))
            .unwrap();
        assert_eq!(moved.level, 1);
        assert_eq!(moved.parent_path, Path::new("/project/docs"));
    }

    #[test]
    fn test_serde_roundtrip_camel_case() {
        let structure = fixture();
        let json = serde_json::to_string(&structure).unwrap();
        assert!(json.contains("\"backgroundLoading\""));
        assert!(json.contains("\"isDirectory\""));
        assert!(json.contains("\"childrenLoaded\""));
        let back: FolderStructure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, structure);
    }
}
