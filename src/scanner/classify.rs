//! File classification rules

use std::path::Path;

/// Extensions accepted in a submission, compared after lowercasing
pub const ALLOWED_EXTENSIONS: &[&str] = &["c", "cpp", "h", "hpp"];

/// The one extension-less file name accepted
pub const MAKEFILE: &str = "Makefile";

/// Directory name excluded from scanning at any depth
pub const VCS_METADATA_DIR: &str = ".git";

/// Whether a file with this path is acceptable in a submission
///
/// Only the final path component matters. A file is allowed when its name is
/// exactly `Makefile` or its lowercased extension is one of
/// [`ALLOWED_EXTENSIONS`]. `makefile` and `README` are violations, `main.C`
/// is not.
pub fn is_allowed(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if name == MAKEFILE {
        return true;
    }

    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Whether the entry name marks version-control metadata
pub fn is_vcs_metadata(name: &std::ffi::OsStr) -> bool {
    name == VCS_METADATA_DIR
}
