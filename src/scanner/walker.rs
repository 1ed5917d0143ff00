//! Repository tree walking

use super::classify::{is_allowed, is_vcs_metadata};
use super::types::ScanResult;
use std::path::Path;
use walkdir::WalkDir;

/// Scan every non-directory entry under `root`
///
/// Symlinks are classified by their own name and never followed. Entries
/// named `.git` are pruned wherever they appear. Entries are visited in
/// file-name order so repeated scans of the same tree agree exactly.
pub fn scan(root: &Path) -> ScanResult {
    let mut result = ScanResult::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_vcs_metadata(entry.file_name()));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_dir() {
                    continue;
                }
                if is_allowed(entry.path()) {
                    result.allowed_count += 1;
                } else {
                    result.violating_paths.push(relative_path(root, entry.path()));
                }
            }
            Err(err) => {
                // The root itself missing means an empty tree
                if err.depth() == 0 {
                    log::debug!("Scan root unavailable: {}", err);
                    continue;
                }
                match err.path() {
                    Some(path) => {
                        log::warn!("Unreadable entry during scan: {}", err);
                        result.violating_paths.push(relative_path(root, path));
                    }
                    None => log::warn!("Scan error without path: {}", err),
                }
            }
        }
    }

    result
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
