//! Scanner Types

use serde::Serialize;

/// Result of scanning one repository tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Disallowed entries, relative to the repository root with `/` separators
    pub violating_paths: Vec<String>,
    /// Number of entries that passed classification
    pub allowed_count: usize,
}

impl ScanResult {
    /// True when no violations were found
    pub fn is_compliant(&self) -> bool {
        self.violating_paths.is_empty()
    }

    /// Total number of classified entries
    pub fn total(&self) -> usize {
        self.allowed_count + self.violating_paths.len()
    }
}
