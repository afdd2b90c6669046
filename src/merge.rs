//! Merge engine
//!
//! Reconciles one artifact's staged files against a persistent output
//! bucket. The policy: a new path is added, identical content is left
//! alone, and differing content keeps whichever file has the greater
//! creation timestamp. The merge never deletes files that have no staged
//! counterpart.
//!
//! The hash-then-timestamp decision is a pure function over two
//! [`FileVersion`]s so it can be tested without touching the filesystem.

use crate::error::{SyncError, SyncResult};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Hash read chunk size
const HASH_CHUNK: usize = 4096;

/// Identity of one file version for conflict resolution
#[derive(Debug, Clone)]
pub struct FileVersion {
    /// Hex-encoded SHA-256 of the file contents
    pub hash: String,
    /// Filesystem creation timestamp (modified time where unsupported)
    pub created: SystemTime,
}

impl FileVersion {
    /// Read the version identity of a file on disk
    pub fn of(path: &Path) -> SyncResult<Self> {
        let meta = fs::metadata(path)
            .map_err(|e| SyncError::io(format!("reading metadata of {}", path.display()), e))?;
        Ok(Self {
            hash: hash_file(path)?,
            created: created_time(&meta),
        })
    }
}

/// Outcome of the pure conflict resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The existing output file survives
    Keep,
    /// The staged candidate replaces the output file
    Replace,
}

/// Decide between an existing output file and a staged candidate.
///
/// Identical content is always kept as-is; otherwise the candidate wins
/// only with a strictly greater creation timestamp — ties never downgrade
/// the existing file.
pub fn resolve(existing: &FileVersion, candidate: &FileVersion) -> Resolution {
    if existing.hash == candidate.hash {
        return Resolution::Keep;
    }
    if candidate.created > existing.created {
        Resolution::Replace
    } else {
        Resolution::Keep
    }
}

/// What happened to a single staged file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Added,
    Replaced,
    Unchanged,
    KeptExisting,
    SkippedEmpty,
}

/// Counters for one merge (or one whole run, via [`MergeStats::absorb`])
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub kept: usize,
    pub skipped_empty: usize,
    pub errors: usize,
}

impl MergeStats {
    /// Fold another set of counters into this one
    pub fn absorb(&mut self, other: &MergeStats) {
        self.added += other.added;
        self.replaced += other.replaced;
        self.unchanged += other.unchanged;
        self.kept += other.kept;
        self.skipped_empty += other.skipped_empty;
        self.errors += other.errors;
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Added => self.added += 1,
            Outcome::Replaced => self.replaced += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::KeptExisting => self.kept += 1,
            Outcome::SkippedEmpty => self.skipped_empty += 1,
        }
    }
}

/// Merge every regular file under `staging` into `bucket`.
///
/// A failure on one file is logged and counted; the remaining files still
/// merge. Failing to walk the staging tree or to create the bucket root
/// is fatal.
pub fn merge_tree(staging: &Path, bucket: &Path) -> SyncResult<MergeStats> {
    fs::create_dir_all(bucket)
        .map_err(|e| SyncError::io(format!("creating bucket {}", bucket.display()), e))?;

    let mut stats = MergeStats::default();
    for entry in WalkDir::new(staging) {
        let entry = entry.map_err(|e| SyncError::io("walking staging directory", e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(staging).map_err(|_| {
            SyncError::Internal(format!(
                "staged file {} outside staging root",
                entry.path().display()
            ))
        })?;

        match merge_file(entry.path(), &bucket.join(relative)) {
            Ok(outcome) => {
                match outcome {
                    Outcome::Added => info!(file = %relative.display(), "found new result file"),
                    Outcome::Replaced => {
                        info!(file = %relative.display(), "found a newer result, replacing")
                    }
                    Outcome::KeptExisting => {
                        info!(file = %relative.display(), "existing result is newer, keeping")
                    }
                    Outcome::SkippedEmpty => {
                        info!(file = %relative.display(), "result file has size 0, skipping")
                    }
                    Outcome::Unchanged => debug!(file = %relative.display(), "content unchanged"),
                }
                stats.record(outcome);
            }
            Err(err) => {
                warn!(file = %relative.display(), %err, "failed to merge staged file");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

/// Merge one staged file into its destination path
fn merge_file(source: &Path, destination: &Path) -> SyncResult<Outcome> {
    let meta = fs::metadata(source)
        .map_err(|e| SyncError::io(format!("reading metadata of {}", source.display()), e))?;

    // Zero-byte artifacts are treated as corrupt, never authoritative.
    if meta.len() == 0 {
        return Ok(Outcome::SkippedEmpty);
    }

    if !destination.exists() {
        copy_into(source, destination)?;
        return Ok(Outcome::Added);
    }

    let existing = FileVersion::of(destination)?;
    let candidate = FileVersion {
        hash: hash_file(source)?,
        created: created_time(&meta),
    };

    if existing.hash == candidate.hash {
        return Ok(Outcome::Unchanged);
    }

    match resolve(&existing, &candidate) {
        Resolution::Replace => {
            copy_into(source, destination)?;
            Ok(Outcome::Replaced)
        }
        Resolution::Keep => Ok(Outcome::KeptExisting),
    }
}

/// Copy `source` over `destination`, creating parents and removing any
/// previous file first
fn copy_into(source: &Path, destination: &Path) -> SyncResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SyncError::io(format!("creating {}", parent.display()), e))?;
    }
    if destination.exists() {
        fs::remove_file(destination)
            .map_err(|e| SyncError::io(format!("removing {}", destination.display()), e))?;
    }
    fs::copy(source, destination).map_err(|e| {
        SyncError::io(
            format!(
                "copying {} to {}",
                source.display(),
                destination.display()
            ),
            e,
        )
    })?;
    Ok(())
}

/// Hex-encoded SHA-256 of a file, streamed in small chunks
pub fn hash_file(path: &Path) -> SyncResult<String> {
    let mut file = File::open(path)
        .map_err(|e| SyncError::io(format!("opening {} for hashing", path.display()), e))?;
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; HASH_CHUNK];
    loop {
        let read = file
            .read(&mut chunk)
            .map_err(|e| SyncError::io(format!("hashing {}", path.display()), e))?;
        if read == 0 {
            break;
        }
        hasher.update(&chunk[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Creation timestamp of a file, falling back to the modified time on
/// filesystems without birth-time support
fn created_time(meta: &fs::Metadata) -> SystemTime {
    meta.created()
        .or_else(|_| meta.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
