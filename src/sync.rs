//! Run orchestration
//!
//! Drives the pipeline: list the remote index, then for each artifact
//! that is neither expired nor past the cutoff, fetch, extract, route to
//! a bucket, and merge. Staging directories are removed unconditionally
//! once an artifact is done, merge trouble or not.

use crate::archive;
use crate::backoff::BackoffPolicy;
use crate::config::Settings;
use crate::error::SyncResult;
use crate::github::{self, ArtifactStore};
use crate::merge::{self, MergeStats};
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Top-level partition of the output tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Cache,
    Results,
}

impl Bucket {
    /// Route an artifact by its name prefix
    pub fn for_artifact(name: &str) -> Self {
        if name.starts_with("cache") {
            Self::Cache
        } else {
            Self::Results
        }
    }

    /// Directory name of the bucket under the output root
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Results => "results",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Artifacts fetched, extracted, and merged
    pub merged: usize,
    /// Artifacts skipped because the index marked them expired
    pub skipped_expired: usize,
    /// Artifacts skipped because they fell past the age cutoff
    pub skipped_stale: usize,
    /// Artifacts skipped after a download failure under PASS_ON_ERROR
    pub skipped_failed: usize,
    /// Aggregated file counters across all merges
    pub files: MergeStats,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} artifact(s) merged ({} expired, {} stale, {} failed skipped); \
             files: {} added, {} replaced, {} unchanged, {} kept, {} empty skipped",
            self.merged,
            self.skipped_expired,
            self.skipped_stale,
            self.skipped_failed,
            self.files.added,
            self.files.replaced,
            self.files.unchanged,
            self.files.kept,
            self.files.skipped_empty,
        )
    }
}

/// Sequential artifact synchronizer
pub struct Syncer<'a, S: ArtifactStore> {
    store: &'a S,
    settings: &'a Settings,
    backoff: BackoffPolicy,
    now: DateTime<Utc>,
}

impl<'a, S: ArtifactStore> Syncer<'a, S> {
    /// Create a syncer; `now` is captured once so the whole run shares
    /// one cutoff
    pub fn new(
        store: &'a S,
        settings: &'a Settings,
        backoff: BackoffPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            settings,
            backoff,
            now,
        }
    }

    /// Run the full pipeline and return a summary
    pub fn run(&self) -> SyncResult<RunReport> {
        ensure_buckets(&self.settings.output)?;

        let artifacts = github::list_artifacts(
            self.store,
            &self.backoff,
            self.settings.days,
            self.now,
            self.settings.pass_on_error,
        )?;
        info!(count = artifacts.len(), "discovered artifacts");

        let mut report = RunReport::default();
        for artifact in &artifacts {
            if artifact.expired {
                info!(
                    name = %artifact.name,
                    created_at = %artifact.created_at,
                    "artifact is expired, skipping"
                );
                report.skipped_expired += 1;
                continue;
            }

            // A few stale entries can ride along on the boundary page.
            if github::older_than(artifact, self.settings.days, self.now) {
                info!(
                    name = %artifact.name,
                    created_at = %artifact.created_at,
                    days = self.settings.days,
                    "artifact is past the age cutoff, skipping"
                );
                report.skipped_stale += 1;
                continue;
            }

            let payload = match self.backoff.retry(|| self.store.download(artifact)) {
                Ok(payload) => payload,
                Err(err) if self.settings.pass_on_error => {
                    warn!(
                        name = %artifact.name,
                        %err,
                        "Error, but PASS_ON_ERROR is set, continuing"
                    );
                    report.skipped_failed += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };

            // The staging directory drops at the end of this iteration,
            // merge errors included.
            let staging = archive::extract(&payload)?;
            let bucket = Bucket::for_artifact(&artifact.name);
            let destination = self.settings.output.join(bucket.as_str());
            info!(name = %artifact.name, %bucket, "merging artifact");

            let stats = merge::merge_tree(staging.path(), &destination)?;
            report.files.absorb(&stats);
            report.merged += 1;
        }

        Ok(report)
    }
}

/// Create the two top-level buckets under the output root
fn ensure_buckets(output: &Path) -> SyncResult<()> {
    for bucket in [Bucket::Cache, Bucket::Results] {
        let path = output.join(bucket.as_str());
        fs::create_dir_all(&path).map_err(|e| {
            crate::error::SyncError::io(format!("creating bucket {}", path.display()), e)
        })?;
    }
    Ok(())
}
