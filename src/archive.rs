//! Artifact archive extraction
//!
//! Unpacks a downloaded ZIP payload into a freshly created temporary
//! directory. The directory is removed when the returned handle drops,
//! so staging state never outlives one artifact's processing.

use crate::error::{SyncError, SyncResult};
use std::fs::{self, File};
use std::io::{self, Cursor};
use tempfile::TempDir;
use tracing::debug;
use zip::ZipArchive;

/// Extract a ZIP payload into a new staging directory.
///
/// A payload that fails to parse is an error; it is never reported as an
/// empty extraction. Entries whose paths would escape the staging root
/// are rejected.
pub fn extract(bytes: &[u8]) -> SyncResult<TempDir> {
    let staging = TempDir::new().map_err(|e| SyncError::io("creating staging directory", e))?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let destination = match entry.enclosed_name() {
            Some(relative) => staging.path().join(relative),
            None => return Err(SyncError::UnsafeArchivePath(entry.name().to_string())),
        };

        if entry.is_dir() {
            fs::create_dir_all(&destination)
                .map_err(|e| SyncError::io("creating staged directory", e))?;
            continue;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SyncError::io("creating staged parent directory", e))?;
        }

        let mut output = File::create(&destination)
            .map_err(|e| SyncError::io(format!("creating staged file {}", entry.name()), e))?;
        io::copy(&mut entry, &mut output)
            .map_err(|e| SyncError::io(format!("writing staged file {}", entry.name()), e))?;
    }

    debug!(path = %staging.path().display(), entries = archive.len(), "extracted artifact");
    Ok(staging)
}
