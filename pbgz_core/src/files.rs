use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use tracing::warn;

use crate::error::PreconditionError;

/// Reject empty paths, a missing source and an existing destination.
pub fn check_paths(source: &Path, destination: &Path) -> Result<(), PreconditionError> {
    if is_blank(source) {
        return Err(PreconditionError::EmptySourcePath);
    }
    if is_blank(destination) {
        return Err(PreconditionError::EmptyDestinationPath);
    }
    if !source.is_file() {
        return Err(PreconditionError::SourceMissing(source.to_path_buf()));
    }
    if destination.exists() {
        return Err(PreconditionError::DestinationExists(destination.to_path_buf()));
    }
    Ok(())
}

/// Create `path` for writing, failing if it already exists.
/// Missing parent directories are created first.
pub fn create_destination(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().read(true).write(true).create_new(true).open(path)
}

/// Best-effort removal of a partially written destination.
/// A failure is logged and otherwise ignored.
pub fn remove_destination(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("exception during deleting {}, error: {e}", path.display()),
    }
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}
