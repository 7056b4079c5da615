use std::fs;
use std::path::Path;

use tracing::debug;

use crate::core::error::{ManagerError, ManagerResult};
use crate::core::step::{StepFailure, StepResult};

/// Directory lifecycle operations used by the install workflow.
///
/// Both operations are idempotent and report failures as `StepFailure`
/// instead of panicking.
pub trait DirectoryOps: Send + Sync {
    /// Create `path` and its parents unless it already exists.
    fn ensure_directory(&self, path: &Path) -> StepResult;

    /// Delete `path` recursively, clearing read-only flags first.
    /// Succeeds without touching anything when `path` does not exist.
    fn remove_directory_tree(&self, path: &Path) -> StepResult;
}

/// `DirectoryOps` backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDirectories;

impl DirectoryOps for LocalDirectories {
    fn ensure_directory(&self, path: &Path) -> StepResult {
        if path.is_dir() {
            return Ok(vec![format!("Directory {} already exists", path.display())]);
        }

        let mut log = vec![format!("Creating directory {}", path.display())];
        if let Err(source) = fs::create_dir_all(path) {
            return Err(StepFailure::new(log, ManagerError::io(path, source)));
        }

        debug!("Created {:?}", path);
        log.push(format!("Created directory {}", path.display()));
        Ok(log)
    }

    fn remove_directory_tree(&self, path: &Path) -> StepResult {
        if fs::symlink_metadata(path).is_err() {
            return Ok(vec![format!("Nothing to remove at {}", path.display())]);
        }

        let mut log = vec![format!("Removing {}", path.display())];

        // Archives often extract files read-only, which blocks remove_dir_all on Windows.
        if let Err(e) = clear_readonly_recursive(path) {
            return Err(StepFailure::new(log, e));
        }
        if let Err(source) = fs::remove_dir_all(path) {
            return Err(StepFailure::new(log, ManagerError::io(path, source)));
        }

        debug!("Removed {:?}", path);
        log.push(format!("Removed {}", path.display()));
        Ok(log)
    }
}

/// Clear the read-only flag on everything below `dir`, children first, then `dir`.
pub fn clear_readonly_recursive(dir: &Path) -> ManagerResult<()> {
    let entries = fs::read_dir(dir).map_err(|source| ManagerError::io(dir, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| ManagerError::io(dir, source))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|source| ManagerError::io(&path, source))?;

        if file_type.is_dir() {
            clear_readonly_recursive(&path)?;
        } else if file_type.is_file() {
            clear_readonly(&path)?;
        }
    }

    clear_readonly(dir)
}

/// Make a single file or directory writable again.
#[allow(clippy::permissions_set_readonly_false)]
pub fn clear_readonly(path: &Path) -> ManagerResult<()> {
    let metadata = fs::metadata(path).map_err(|source| ManagerError::io(path, source))?;
    let mut permissions = metadata.permissions();
    if !permissions.readonly() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        permissions.set_readonly(false);
    }

    fs::set_permissions(path, permissions).map_err(|source| ManagerError::io(path, source))
}
