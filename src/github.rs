//! GitHub Actions artifact index client
//!
//! Wire types for the artifacts endpoint, the age cutoff predicate, and
//! paginated listing with an early stop once a page reaches past the
//! cutoff. The `ArtifactStore` trait is the seam the orchestrator and
//! tests work against; `GithubClient` is the ureq-backed implementation.

use crate::backoff::BackoffPolicy;
use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};
use ureq::Agent;

/// Page size for the artifact index (API maximum)
pub const PER_PAGE: u32 = 100;

/// API version plus the two preview feature flags the endpoint expects
const ACCEPT: &str = "application/vnd.github.v3+json;\
application/vnd.github.antiope-preview+json;\
application/vnd.github.shadow-cat-preview+json";

/// Bodies larger than this are refused; ureq otherwise caps reads at 10 MiB
const MAX_ARCHIVE_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// One retrievable artifact, as reported by the index
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactDescriptor {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub expired: bool,
    pub archive_download_url: String,
}

/// One page of the artifact index
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactPage {
    pub artifacts: Vec<ArtifactDescriptor>,
    pub total_count: u64,
}

/// Remote source of artifact pages and archive payloads
pub trait ArtifactStore {
    /// Fetch one page of the artifact index (pages are 1-based)
    fn fetch_page(&self, page: u32) -> SyncResult<ArtifactPage>;

    /// Download one artifact's ZIP payload
    fn download(&self, artifact: &ArtifactDescriptor) -> SyncResult<Vec<u8>>;
}

/// Is the artifact older than `days`, measured against `now`?
///
/// `now` is captured once per run so every decision in a run shares the
/// same notion of "today".
pub fn older_than(artifact: &ArtifactDescriptor, days: u32, now: DateTime<Utc>) -> bool {
    let cutoff = now - chrono::Duration::days(i64::from(days));
    artifact.created_at < cutoff
}

/// List all artifacts visible through the index, newest-first.
///
/// Pages until a short page is returned, or until a page contains an
/// artifact past the cutoff — the index is ordered most-recent first, so
/// one stale entry means the rest of the index is not worth the API cost.
/// The boundary page itself is still included. Under `pass_on_error` a
/// failed page is logged, treated as empty, and ends the traversal.
pub fn list_artifacts<S: ArtifactStore>(
    store: &S,
    backoff: &BackoffPolicy,
    days: u32,
    now: DateTime<Utc>,
    pass_on_error: bool,
) -> SyncResult<Vec<ArtifactDescriptor>> {
    let mut results = Vec::new();
    let mut page = 1u32;

    loop {
        info!(page, "retrieving artifact index page");
        let fetched = match backoff.retry(|| store.fetch_page(page)) {
            Ok(fetched) => fetched,
            Err(err) if pass_on_error => {
                warn!(%err, "Error, but PASS_ON_ERROR is set, continuing");
                break;
            }
            Err(err) => return Err(err),
        };

        let count = fetched.artifacts.len();
        let reached_cutoff = fetched.artifacts.iter().any(|a| older_than(a, days, now));
        results.extend(fetched.artifacts);

        if reached_cutoff {
            info!(days, "results are older than the cutoff, stopping query");
            break;
        }
        if count < PER_PAGE as usize {
            break;
        }
        page += 1;
    }

    Ok(results)
}

/// Artifact index client backed by blocking HTTP
pub struct GithubClient {
    agent: Agent,
    artifacts_url: String,
    token: String,
}

impl GithubClient {
    /// Create a client for one repository's artifact index
    pub fn new(api_url: &str, repository: &str, token: &str) -> Self {
        // Non-2xx statuses are inspected by hand rather than surfaced as
        // transport errors, so rate-limit signals stay distinguishable.
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self {
            agent,
            artifacts_url: format!("{}/repos/{}/actions/artifacts", api_url, repository),
            token: token.to_string(),
        }
    }

    fn authorization(&self) -> String {
        format!("token {}", self.token)
    }

    /// Map a non-success status to the corresponding error
    fn status_error(status: u16, context: &str) -> SyncError {
        if status == 429 || status == 403 {
            SyncError::RateLimited
        } else {
            SyncError::ApiStatus {
                status,
                context: context.to_string(),
            }
        }
    }
}

impl ArtifactStore for GithubClient {
    fn fetch_page(&self, page: u32) -> SyncResult<ArtifactPage> {
        debug!(url = %self.artifacts_url, page, "requesting artifact index");
        let mut response = self
            .agent
            .get(&self.artifacts_url)
            .query("per_page", PER_PAGE.to_string())
            .query("page", page.to_string())
            .header("Authorization", self.authorization())
            .header("Accept", ACCEPT)
            .call()
            .map_err(|e| SyncError::http("retrieving artifact index", e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(Self::status_error(status, "unable to retrieve artifacts"));
        }

        response
            .body_mut()
            .read_json()
            .map_err(|e| SyncError::http("decoding artifact index", e))
    }

    fn download(&self, artifact: &ArtifactDescriptor) -> SyncResult<Vec<u8>> {
        debug!(name = %artifact.name, url = %artifact.archive_download_url, "downloading artifact");
        let mut response = self
            .agent
            .get(&artifact.archive_download_url)
            .header("Authorization", self.authorization())
            .header("Accept", ACCEPT)
            .call()
            .map_err(|e| SyncError::http("downloading artifact", e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(Self::status_error(
                status,
                &format!("unable to download artifact {}", artifact.name),
            ));
        }

        response
            .body_mut()
            .with_config()
            .limit(MAX_ARCHIVE_BYTES)
            .read_to_vec()
            .map_err(|e| SyncError::http("reading artifact payload", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    fn artifact(name: &str, age_days: i64, expired: bool) -> ArtifactDescriptor {
        ArtifactDescriptor {
            name: name.to_string(),
            created_at: Utc::now() - chrono::Duration::days(age_days),
            expired,
            archive_download_url: format!("https://example.invalid/{name}.zip"),
        }
    }

    fn page_of(artifacts: Vec<ArtifactDescriptor>) -> ArtifactPage {
        let total_count = artifacts.len() as u64;
        ArtifactPage {
            artifacts,
            total_count,
        }
    }

    fn full_page(prefix: &str) -> ArtifactPage {
        let artifacts = (0..PER_PAGE)
            .map(|i| artifact(&format!("{prefix}-{i}"), 0, false))
            .collect();
        page_of(artifacts)
    }

    struct MockStore {
        pages: RefCell<VecDeque<SyncResult<ArtifactPage>>>,
        fetches: Cell<u32>,
    }

    impl MockStore {
        fn with_pages(pages: Vec<SyncResult<ArtifactPage>>) -> Self {
            Self {
                pages: RefCell::new(pages.into()),
                fetches: Cell::new(0),
            }
        }
    }

    impl ArtifactStore for MockStore {
        fn fetch_page(&self, _page: u32) -> SyncResult<ArtifactPage> {
            self.fetches.set(self.fetches.get() + 1);
            self.pages
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(ArtifactPage::default()))
        }

        fn download(&self, _artifact: &ArtifactDescriptor) -> SyncResult<Vec<u8>> {
            unimplemented!("lister tests never download")
        }
    }

    #[test]
    fn older_than_respects_cutoff() {
        let now = Utc::now();
        assert!(older_than(&artifact("old", 3, false), 2, now));
        assert!(!older_than(&artifact("fresh", 1, false), 2, now));
    }

    #[test]
    fn list_returns_empty_index_without_error() {
        let store = MockStore::with_pages(vec![Ok(ArtifactPage::default())]);
        let results =
            list_artifacts(&store, &BackoffPolicy::immediate(0), 2, Utc::now(), false).unwrap();
        assert!(results.is_empty());
        assert_eq!(store.fetches.get(), 1);
    }

    #[test]
    fn list_stops_on_stale_page_but_includes_it() {
        let boundary = page_of(vec![
            artifact("fresh-a", 0, false),
            artifact("fresh-b", 1, false),
            artifact("stale", 5, false),
        ]);
        let store = MockStore::with_pages(vec![Ok(boundary)]);
        let results =
            list_artifacts(&store, &BackoffPolicy::immediate(0), 2, Utc::now(), false).unwrap();
        // the boundary page is still part of the result
        assert_eq!(results.len(), 3);
        assert_eq!(store.fetches.get(), 1);
    }

    #[test]
    fn list_stops_paging_after_stale_full_page() {
        let mut stale_full = full_page("fresh");
        stale_full.artifacts[99] = artifact("stale", 10, false);
        let store = MockStore::with_pages(vec![Ok(stale_full), Ok(full_page("unreached"))]);
        let results =
            list_artifacts(&store, &BackoffPolicy::immediate(0), 2, Utc::now(), false).unwrap();
        assert_eq!(results.len(), PER_PAGE as usize);
        assert_eq!(store.fetches.get(), 1);
    }

    #[test]
    fn list_pages_through_full_pages_until_short_page() {
        let last = page_of(vec![artifact("tail-a", 0, false), artifact("tail-b", 0, false)]);
        let store = MockStore::with_pages(vec![Ok(full_page("p1")), Ok(full_page("p2")), Ok(last)]);
        let results =
            list_artifacts(&store, &BackoffPolicy::immediate(0), 2, Utc::now(), false).unwrap();
        assert_eq!(results.len(), 2 * PER_PAGE as usize + 2);
        assert_eq!(store.fetches.get(), 3);
    }

    #[test]
    fn list_retries_through_rate_limit() {
        let page = page_of(vec![artifact("only", 0, false)]);
        let store = MockStore::with_pages(vec![Err(SyncError::RateLimited), Ok(page)]);
        let results =
            list_artifacts(&store, &BackoffPolicy::immediate(3), 2, Utc::now(), false).unwrap();
        // same outcome as an immediate success
        assert_eq!(results.len(), 1);
        assert_eq!(store.fetches.get(), 2);
    }

    #[test]
    fn list_aborts_on_api_failure() {
        let store = MockStore::with_pages(vec![Err(SyncError::ApiStatus {
            status: 500,
            context: "unable to retrieve artifacts".to_string(),
        })]);
        let result = list_artifacts(&store, &BackoffPolicy::immediate(0), 2, Utc::now(), false);
        assert!(matches!(result, Err(SyncError::ApiStatus { .. })));
    }

    #[test]
    fn list_continues_past_api_failure_with_pass_on_error() {
        let store = MockStore::with_pages(vec![Err(SyncError::ApiStatus {
            status: 500,
            context: "unable to retrieve artifacts".to_string(),
        })]);
        let results =
            list_artifacts(&store, &BackoffPolicy::immediate(0), 2, Utc::now(), true).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn list_pass_on_error_keeps_earlier_pages() {
        let store = MockStore::with_pages(vec![
            Ok(full_page("p1")),
            Err(SyncError::ApiStatus {
                status: 502,
                context: "unable to retrieve artifacts".to_string(),
            }),
        ]);
        let results =
            list_artifacts(&store, &BackoffPolicy::immediate(0), 2, Utc::now(), true).unwrap();
        assert_eq!(results.len(), PER_PAGE as usize);
    }

    #[test]
    fn status_error_classifies_rate_limits() {
        assert!(GithubClient::status_error(429, "x").is_rate_limit());
        assert!(GithubClient::status_error(403, "x").is_rate_limit());
        assert!(!GithubClient::status_error(404, "x").is_rate_limit());
    }

    #[test]
    fn descriptor_deserializes_from_index_json() {
        let json = r#"{
            "total_count": 1,
            "artifacts": [{
                "id": 11,
                "name": "cache-linux",
                "size_in_bytes": 123,
                "created_at": "2026-08-20T10:00:00Z",
                "expired": false,
                "archive_download_url": "https://api.github.com/repos/o/r/actions/artifacts/11/zip"
            }]
        }"#;
        let page: ArtifactPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.artifacts[0].name, "cache-linux");
        assert!(!page.artifacts[0].expired);
    }
}
