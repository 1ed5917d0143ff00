//! Tree Scanner
//!
//! Walks a checked-out repository and classifies every entry against the
//! source-file allow-list. Version-control metadata is never visited.
//! Scanning is read-only and total: entries that cannot be read are reported
//! as violations instead of failing the scan.

pub mod classify;
pub mod types;
pub mod walker;

pub use classify::{is_allowed, ALLOWED_EXTENSIONS, MAKEFILE, VCS_METADATA_DIR};
pub use types::ScanResult;
pub use walker::scan;

#[cfg(test)]
mod tests;
