//! artsync - GitHub Actions artifact synchronizer
//!
//! CLI entry point: resolve settings, build the API client, run the
//! sync pipeline, print a summary.

use artsync::backoff::BackoffPolicy;
use artsync::cli::Cli;
use artsync::config::Settings;
use artsync::github::GithubClient;
use artsync::sync::Syncer;
use artsync::SyncResult;
use chrono::Utc;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> SyncResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = info (per-artifact progress), 1 = debug, 2+ = trace
    let filter = match cli.verbose {
        0 => EnvFilter::new("artsync=info"),
        1 => EnvFilter::new("artsync=debug"),
        _ => EnvFilter::new("artsync=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let settings = Settings::resolve(&cli)?;
    let client = GithubClient::new(&settings.api_url, &settings.repository, &settings.token);

    let syncer = Syncer::new(&client, &settings, BackoffPolicy::default(), Utc::now());
    let report = syncer.run()?;

    println!("{} {}", style("Synced:").green().bold(), report);
    Ok(())
}
