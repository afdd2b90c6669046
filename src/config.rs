//! Run settings resolved from CLI flags and the environment
//!
//! Required values are validated here, before any network activity.

use crate::cli::Cli;
use crate::error::{SyncError, SyncResult};
use std::path::PathBuf;

/// Default output directory, relative to the working directory
pub const DEFAULT_OUTPUT: &str = "artifacts";

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Repository in owner/name form
    pub repository: String,
    /// API token for index and download requests
    pub token: String,
    /// Root of the persistent output tree
    pub output: PathBuf,
    /// Age cutoff in days
    pub days: u32,
    /// Downgrade remote-call failures to warnings
    pub pass_on_error: bool,
    /// API base URL
    pub api_url: String,
}

impl Settings {
    /// Resolve settings from parsed CLI arguments.
    ///
    /// The repository falls back to `GITHUB_REPOSITORY`, which Actions sets
    /// for every job, so the flag is only needed when syncing a different
    /// repository than the one running the workflow.
    pub fn resolve(cli: &Cli) -> SyncResult<Self> {
        let repository = cli
            .repository
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| ambient_repository())
            .ok_or(SyncError::MissingConfig {
                name: "INPUT_REPOSITORY",
            })?;

        let token = cli
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(SyncError::MissingConfig {
                name: "GITHUB_TOKEN",
            })?;

        Ok(Self {
            repository,
            token,
            output: cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            days: cli.days,
            pass_on_error: cli.pass_on_error,
            api_url: cli.api_url.trim_end_matches('/').to_string(),
        })
    }
}

/// The repository of the currently running workflow, if any
fn ambient_repository() -> Option<String> {
    std::env::var("GITHUB_REPOSITORY")
        .ok()
        .filter(|r| !r.is_empty())
}
