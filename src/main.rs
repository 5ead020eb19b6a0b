use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc;

use ztree::{logging, StateStore, TreeEvent, TreeLoader, TreeNode};

fn main() -> ExitCode {
    let _logging = logging::init();

    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("usage: ztree <directory>");
        return ExitCode::FAILURE;
    };

    let (tx, rx) = mpsc::channel();
    let mut loader = TreeLoader::new(tx);
    if let Some(store) = StateStore::default_location() {
        // 上次的树先亮出来，扫描在后台重新跑
        if let Some(last) = store.load() {
            let (dirs, files) = tally(&last.tree);
            println!(
                "last session: {} ({dirs} directories, {files} files)",
                last.root.display()
            );
        }
        loader = loader.with_store(store);
    }

    let session = match loader.open_root(Path::new(path)) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("ztree: {err}");
            return ExitCode::FAILURE;
        }
    };

    let initial = session.snapshot();
    println!("{}: {} entries at level 0", initial.name, initial.tree.len());

    for event in rx {
        if event.generation() != session.generation() {
            continue;
        }
        match event {
            TreeEvent::Initial { .. } => {}
            TreeEvent::Bounded { structure, .. } => {
                let (dirs, files) = tally(&structure.tree);
                println!("bounded scan: {dirs} directories, {files} files");
            }
            TreeEvent::Progress { progress, .. } => {
                println!(
                    "scanning {:>3}% ({}/{}) {}",
                    progress.percent(),
                    progress.loaded_directories,
                    progress.total_directories,
                    progress.current_path.display()
                );
            }
            TreeEvent::Complete { structure, .. } => {
                let (dirs, files) = tally(&structure.tree);
                println!("complete: {dirs} directories, {files} files");
                break;
            }
            TreeEvent::Error { error, .. } => {
                eprintln!("background scan failed: {error}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn tally(tree: &[TreeNode]) -> (u64, u64) {
    let mut dirs = 0;
    let mut files = 0;
    let mut stack: Vec<&TreeNode> = tree.iter().collect();
    while let Some(node) = stack.pop() {
        if node.is_directory {
            dirs += 1;
        } else {
            files += 1;
        }
        stack.extend(node.children.iter());
    }
    (dirs, files)
}
