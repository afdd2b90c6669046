//! CLI argument definitions using clap derive
//!
//! Every option falls back to the environment variable the scheduled job
//! sets, so the binary runs unmodified as a GitHub Actions step.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// artsync - Sync GitHub Actions artifacts into a local tree
///
/// Pulls down artifacts uploaded by prior CI runs, partitions them into
/// cache and results buckets, and merges new or changed files into a
/// persistent output directory (newer creation time wins).
#[derive(Parser, Debug)]
#[command(name = "artsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// GitHub repository to pull artifacts from (owner/name)
    #[arg(short, long, env = "INPUT_REPOSITORY")]
    pub repository: Option<String>,

    /// API token used for index and download requests
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory receiving the cache/ and results/ buckets
    #[arg(short, long, env = "INPUT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Ignore artifacts created more than this many days ago
    #[arg(short, long, env = "INPUT_DAYS", default_value_t = 2)]
    pub days: u32,

    /// Log remote-call failures and continue instead of aborting the run
    #[arg(long, env = "PASS_ON_ERROR")]
    pub pass_on_error: bool,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
