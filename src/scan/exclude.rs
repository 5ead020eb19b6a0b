/// 深层递归遍历永不进入的目录名。
///
/// 只作用于全量后台扫描和计数预扫；level-0 与有界扫描刻意不过滤，
/// 让被排除目录以未展开节点的形式先出现在树里。只看目录名，
/// 不做 glob / gitignore 语义。
pub fn should_exclude(name: &str) -> bool {
    name.starts_with('.')
        || matches!(
            name,
            "node_modules" | "dist" | "build" | "coverage" | "target" | "bin" | "obj" | "__pycache__"
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excludes_hidden_and_build_output() {
        assert!(should_exclude(".git"));
        assert!(should_exclude(".cache"));
        assert!(should_exclude("node_modules"));
        assert!(should_exclude("target"));
        assert!(should_exclude("__pycache__"));
        assert!(should_exclude("obj"));
    }

    #[test]
    fn test_keeps_ordinary_names() {
        assert!(!should_exclude("src"));
        assert!(!should_exclude("builds"));
        assert!(!should_exclude("distributed"));
        assert!(!should_exclude("Bin"));
    }
}
