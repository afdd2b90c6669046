//! artsync - GitHub Actions artifact synchronizer
//!
//! Pulls artifacts uploaded by prior CI runs down from the GitHub API,
//! partitions them into cache and results buckets, and merges new or
//! changed files into a persistent output tree (newer creation time wins).

pub mod archive;
pub mod backoff;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod merge;
pub mod sync;

pub use error::{SyncError, SyncResult};
