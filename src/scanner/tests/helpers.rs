//! Tree building helpers for scanner tests

use std::path::Path;
use tempfile::TempDir;

/// Create a temporary tree containing `files` (relative paths)
pub fn tree_with(files: &[&str]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for file in files {
        write_file(dir.path(), file);
    }
    dir
}

pub fn write_file(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(&path, b"content").expect("write file");
}
