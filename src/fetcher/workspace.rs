//! Scratch Workspace Management
//!
//! Every request clones into `<scratch dir>/workspaces/<name>`. The
//! `workspaces` directory belongs to the service and carries a marker file;
//! nothing outside it is ever removed. The manager keeps a registry of live
//! workspace paths so a name can never be handed out twice while it is in
//! use, and each [`ScratchWorkspace`] removes its directory when released or
//! dropped.

use super::error::{WorkspaceError, WorkspaceResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const REPO_DIR_NAME: &str = "repo";
const MAX_NAME_LEN: usize = 64;

/// Subdirectory of the configured scratch directory owned by the service
pub const WORKSPACES_DIR_NAME: &str = "workspaces";

/// Written into the workspaces directory when the service creates it
pub const ROOT_MARKER: &str = ".submission-check";

type Registry = Arc<Mutex<HashSet<PathBuf>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, HashSet<PathBuf>> {
    // The set stays consistent even if a holder panicked
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns true for names safe to use as a single path component
pub fn is_valid_workspace_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Hands out per-request scratch workspaces under a common root
#[derive(Debug, Clone)]
pub struct ScratchManager {
    root: PathBuf,
    active: Registry,
}

impl ScratchManager {
    /// Workspaces live in the `workspaces` child of `scratch_dir`
    pub fn new(scratch_dir: impl AsRef<Path>) -> Self {
        Self {
            root: scratch_dir.as_ref().join(WORKSPACES_DIR_NAME),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// The directory workspaces are created in
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the workspaces directory and remove leftovers from a previous run
    ///
    /// Returns the number of stale workspaces removed. Only directories with
    /// workspace names are candidates; live workspaces, the marker and any
    /// other entry are kept. An existing non-empty directory without the
    /// marker was not created by this service and is refused with
    /// [`WorkspaceError::ForeignRoot`].
    pub fn prepare_root(&self) -> WorkspaceResult<usize> {
        let io_err = |source| WorkspaceError::Io {
            path: self.root.clone(),
            source,
        };

        let marker = self.root.join(ROOT_MARKER);
        if !marker.is_file() {
            if self.root.is_dir() && std::fs::read_dir(&self.root).map_err(io_err)?.next().is_some() {
                return Err(WorkspaceError::ForeignRoot(self.root.clone()));
            }
            std::fs::create_dir_all(&self.root).map_err(io_err)?;
            std::fs::write(&marker, b"").map_err(|source| WorkspaceError::Io {
                path: marker.clone(),
                source,
            })?;
            return Ok(0);
        }

        let mut removed = 0;
        for entry in std::fs::read_dir(&self.root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let path = entry.path();
            let is_workspace = entry.file_type().map_err(io_err)?.is_dir()
                && entry.file_name().to_str().is_some_and(is_valid_workspace_name);
            if !is_workspace || self.is_active(&path) {
                continue;
            }

            std::fs::remove_dir_all(&path).map_err(|source| WorkspaceError::Io {
                path: path.clone(),
                source,
            })?;
            log::debug!("Removed stale workspace {}", path.display());
            removed += 1;
        }

        Ok(removed)
    }

    /// Acquire a workspace under a freshly generated name
    ///
    /// Concurrent requests never share a path, whatever id they carry.
    pub fn acquire_unique(&self) -> WorkspaceResult<ScratchWorkspace> {
        self.acquire(&uuid::Uuid::new_v4().to_string())
    }

    /// Create and register the workspace `<root>/<name>`
    ///
    /// Fails with [`WorkspaceError::InUse`] while another request holds the
    /// same name. Leftover content at the path from an aborted run is removed.
    pub fn acquire(&self, name: &str) -> WorkspaceResult<ScratchWorkspace> {
        if !is_valid_workspace_name(name) {
            return Err(WorkspaceError::InvalidName(name.to_string()));
        }

        let path = self.root.join(name);

        {
            let mut active = lock(&self.active);
            if !active.insert(path.clone()) {
                return Err(WorkspaceError::InUse(path));
            }
        }

        // From here on the workspace owns the registration and unregisters on drop
        let workspace = ScratchWorkspace {
            path: path.clone(),
            registry: self.active.clone(),
            released: false,
        };

        if path.exists() {
            std::fs::remove_dir_all(&path).map_err(|source| WorkspaceError::Io {
                path: path.clone(),
                source,
            })?;
        }
        std::fs::create_dir_all(&path).map_err(|source| WorkspaceError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(workspace)
    }

    /// Number of live workspaces
    pub fn active_count(&self) -> usize {
        lock(&self.active).len()
    }

    pub fn is_active(&self, path: &Path) -> bool {
        lock(&self.active).contains(path)
    }
}

/// A scratch directory exclusively owned by one request
#[derive(Debug)]
pub struct ScratchWorkspace {
    path: PathBuf,
    registry: Registry,
    released: bool,
}

impl ScratchWorkspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the repository is cloned inside the workspace
    pub fn repo_dir(&self) -> PathBuf {
        self.path.join(REPO_DIR_NAME)
    }

    /// Remove the workspace directory and unregister it
    pub fn release(mut self) -> WorkspaceResult<()> {
        self.cleanup()
    }

    fn cleanup(&mut self) -> WorkspaceResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let result = if self.path.exists() {
            std::fs::remove_dir_all(&self.path).map_err(|source| WorkspaceError::Io {
                path: self.path.clone(),
                source,
            })
        } else {
            Ok(())
        };

        lock(&self.registry).remove(&self.path);
        result
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            log::warn!("Failed to remove scratch workspace on drop: {}", e);
        }
    }
}
