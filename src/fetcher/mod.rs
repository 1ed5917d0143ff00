//! Repository Fetcher
//!
//! Materializes a submitted repository into a per-request scratch workspace.
//!
//! - [`ScratchManager`] hands out uniquely named workspaces under the scratch
//!   root and tracks which ones are live, so two requests never share a path.
//! - [`ScratchWorkspace`] owns its directory and removes it on release or drop.
//! - [`RepositoryFetcher`] runs a bounded `git clone` authenticated with the
//!   configured key only, over ssh or https unless told otherwise.

pub mod clone;
pub mod error;
pub mod workspace;

pub use clone::{describe_remote, validate_url, RepositoryFetcher, DEFAULT_CLONE_TIMEOUT};
pub use error::{CloneError, FetchResult, WorkspaceError, WorkspaceResult};
pub use workspace::{ScratchManager, ScratchWorkspace, ROOT_MARKER, WORKSPACES_DIR_NAME};
