//! Integration tests for artsync

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    /// Command with the ambient CI environment scrubbed
    fn artsync() -> Command {
        let mut cmd = cargo_bin_cmd!("artsync");
        for name in [
            "INPUT_REPOSITORY",
            "GITHUB_REPOSITORY",
            "GITHUB_TOKEN",
            "INPUT_OUTPUT",
            "INPUT_DAYS",
            "PASS_ON_ERROR",
            "GITHUB_API_URL",
        ] {
            cmd.env_remove(name);
        }
        cmd
    }

    #[test]
    fn help_displays() {
        artsync()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Sync GitHub Actions artifacts"));
    }

    #[test]
    fn version_displays() {
        artsync()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("artsync"));
    }

    #[test]
    fn missing_repository_fails_before_network() {
        artsync()
            .assert()
            .failure()
            .stderr(predicate::str::contains("INPUT_REPOSITORY is required."));
    }

    #[test]
    fn missing_token_fails_with_hint() {
        artsync()
            .args(["--repository", "octo/widgets"])
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("GITHUB_TOKEN is required.")
                    .and(predicate::str::contains("Hint:")),
            );
    }

    #[test]
    fn repository_accepted_from_environment() {
        // Still fails on the missing token, not the repository
        artsync()
            .env("GITHUB_REPOSITORY", "octo/widgets")
            .assert()
            .failure()
            .stderr(predicate::str::contains("GITHUB_TOKEN is required."));
    }
}
