//! Paginated retrieval of tests matching a JQL filter.
//!
//! The fetcher walks `getTests` pages until the server-reported total is
//! reached, classifying the run into a [`FetchOutcome`] instead of deciding
//! abort-vs-continue itself. That decision belongs to the caller, via a
//! [`FailurePolicy`].

use crate::xray::{PageSource, Test, XrayError};
use anyhow::Result;
use std::time::Duration;

/// Default pause between successive page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(200);

/// What a fetch run produced.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The server reported no matching tests (total zero or absent).
    Empty,
    /// A page request failed; `tests` holds everything accumulated before
    /// the failure (empty when the very first page failed).
    Partial { tests: Vec<Test>, cause: XrayError },
    /// Every page up to the reported total (or an early empty page) arrived.
    Complete(Vec<Test>),
}

/// How a [`FetchOutcome::Partial`] is resolved into rows or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// A first-page failure is treated like "no tests matched" (logged,
    /// empty export, success exit); any later failure aborts the run.
    EmptyFirstPage,
    /// Any failure aborts the run.
    Strict,
    /// Keep whatever was fetched before the failure and warn.
    KeepPartial,
}

impl FailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "empty-first-page" => Some(FailurePolicy::EmptyFirstPage),
            "strict" => Some(FailurePolicy::Strict),
            "keep-partial" => Some(FailurePolicy::KeepPartial),
            _ => None,
        }
    }
}

/// Fetch every test matching `jql`, page by page.
///
/// Offsets advance by the limit the server reports for each page, not the
/// requested one, so a server that silently caps page size still paginates
/// correctly. An empty page ends the loop early even if the reported total
/// has not been reached -- the total is not trusted enough to loop forever.
pub async fn fetch_all<S>(source: &S, jql: &str, limit: u64, delay: Duration) -> FetchOutcome
where
    S: PageSource + ?Sized,
{
    let first = match source.fetch_page(jql, limit, 0).await {
        Ok(page) => page,
        Err(cause) => {
            tracing::warn!(error = %cause, "first page request failed");
            return FetchOutcome::Partial {
                tests: Vec::new(),
                cause,
            };
        }
    };

    let total = match first.total {
        Some(total) if total > 0 => total,
        _ => return FetchOutcome::Empty,
    };

    let mut batch_len = first.tests.len();
    let mut start = first.limit;
    let mut tests = first.tests;
    tracing::info!(%total, fetched = tests.len(), "first page received");

    while start < total && batch_len > 0 {
        tokio::time::sleep(delay).await;

        match source.fetch_page(jql, limit, start).await {
            Ok(page) => {
                batch_len = page.tests.len();
                start += page.limit;
                tests.extend(page.tests);
                tracing::debug!(fetched = tests.len(), %total, "page received");
            }
            Err(cause) => {
                tracing::warn!(error = %cause, fetched = tests.len(), "page request failed");
                return FetchOutcome::Partial { tests, cause };
            }
        }
    }

    FetchOutcome::Complete(tests)
}

/// Apply the failure policy to a fetch outcome.
pub fn resolve(outcome: FetchOutcome, policy: FailurePolicy) -> Result<Vec<Test>> {
    match outcome {
        FetchOutcome::Empty => Ok(Vec::new()),
        FetchOutcome::Complete(tests) => Ok(tests),
        FetchOutcome::Partial { tests, cause } => match policy {
            FailurePolicy::Strict => Err(cause.into()),
            FailurePolicy::KeepPartial => {
                tracing::warn!(error = %cause, kept = tests.len(), "continuing with partial results");
                Ok(tests)
            }
            FailurePolicy::EmptyFirstPage => {
                if tests.is_empty() {
                    tracing::warn!(error = %cause, "treating first-page failure as empty result");
                    Ok(Vec::new())
                } else {
                    Err(cause.into())
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xray::Page;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed script of page responses and records requested offsets.
    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<Page, XrayError>>>,
        offsets: Mutex<Vec<u64>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Page, XrayError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                offsets: Mutex::new(Vec::new()),
            }
        }

        fn offsets(&self) -> Vec<u64> {
            self.offsets.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(&self, _jql: &str, _limit: u64, start: u64) -> Result<Page, XrayError> {
            self.offsets.lock().unwrap().push(start);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra page request")
        }
    }

    fn page(total: u64, limit: u64, count: usize) -> Result<Page, XrayError> {
        Ok(Page {
            total: Some(total),
            limit,
            tests: (0..count).map(|_| Test::default()).collect(),
        })
    }

    fn boom() -> XrayError {
        XrayError::Graphql("boom".to_string())
    }

    #[tokio::test]
    async fn paginates_to_reported_total() {
        let source = ScriptedSource::new(vec![
            page(250, 100, 100),
            page(250, 100, 100),
            page(250, 100, 50),
        ]);

        let outcome = fetch_all(&source, "project = T", 100, Duration::ZERO).await;
        match outcome {
            FetchOutcome::Complete(tests) => assert_eq!(tests.len(), 250),
            other => panic!("expected Complete, got {other:?}"),
        }
        assert_eq!(source.offsets(), vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn advances_by_server_reported_limit() {
        // Requested 100 but the server caps pages at 50.
        let source = ScriptedSource::new(vec![
            page(120, 50, 50),
            page(120, 50, 50),
            page(120, 50, 20),
        ]);

        let outcome = fetch_all(&source, "project = T", 100, Duration::ZERO).await;
        match outcome {
            FetchOutcome::Complete(tests) => assert_eq!(tests.len(), 120),
            other => panic!("expected Complete, got {other:?}"),
        }
        assert_eq!(source.offsets(), vec![0, 50, 100]);
    }

    #[tokio::test]
    async fn stops_early_on_empty_page() {
        // Total claims 250 but the second page is empty: keep the first page
        // and make no third request.
        let source = ScriptedSource::new(vec![page(250, 100, 100), page(250, 100, 0)]);

        let outcome = fetch_all(&source, "project = T", 100, Duration::ZERO).await;
        match outcome {
            FetchOutcome::Complete(tests) => assert_eq!(tests.len(), 100),
            other => panic!("expected Complete, got {other:?}"),
        }
        assert_eq!(source.offsets(), vec![0, 100]);
    }

    #[tokio::test]
    async fn zero_total_is_empty_without_further_requests() {
        let source = ScriptedSource::new(vec![page(0, 100, 0)]);
        let outcome = fetch_all(&source, "project = T", 100, Duration::ZERO).await;
        assert!(matches!(outcome, FetchOutcome::Empty));
        assert_eq!(source.offsets(), vec![0]);
    }

    #[tokio::test]
    async fn absent_total_is_empty() {
        let source = ScriptedSource::new(vec![Ok(Page {
            total: None,
            limit: 100,
            tests: Vec::new(),
        })]);
        let outcome = fetch_all(&source, "project = T", 100, Duration::ZERO).await;
        assert!(matches!(outcome, FetchOutcome::Empty));
    }

    #[tokio::test]
    async fn first_page_failure_is_partial_with_nothing() {
        let source = ScriptedSource::new(vec![Err(boom())]);
        let outcome = fetch_all(&source, "project = T", 100, Duration::ZERO).await;
        match outcome {
            FetchOutcome::Partial { tests, .. } => assert!(tests.is_empty()),
            other => panic!("expected Partial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mid_loop_failure_keeps_accumulated_tests() {
        let source = ScriptedSource::new(vec![page(250, 100, 100), Err(boom())]);
        let outcome = fetch_all(&source, "project = T", 100, Duration::ZERO).await;
        match outcome {
            FetchOutcome::Partial { tests, .. } => assert_eq!(tests.len(), 100),
            other => panic!("expected Partial, got {other:?}"),
        }
    }

    #[test]
    fn default_policy_maps_first_page_failure_to_empty() {
        let outcome = FetchOutcome::Partial {
            tests: Vec::new(),
            cause: boom(),
        };
        let tests = resolve(outcome, FailurePolicy::EmptyFirstPage).unwrap();
        assert!(tests.is_empty());
    }

    #[test]
    fn default_policy_propagates_mid_loop_failure() {
        let outcome = FetchOutcome::Partial {
            tests: vec![Test::default()],
            cause: boom(),
        };
        assert!(resolve(outcome, FailurePolicy::EmptyFirstPage).is_err());
    }

    #[test]
    fn strict_policy_propagates_any_failure() {
        let outcome = FetchOutcome::Partial {
            tests: Vec::new(),
            cause: boom(),
        };
        assert!(resolve(outcome, FailurePolicy::Strict).is_err());
    }

    #[test]
    fn keep_partial_policy_keeps_rows() {
        let outcome = FetchOutcome::Partial {
            tests: vec![Test::default(), Test::default()],
            cause: boom(),
        };
        let tests = resolve(outcome, FailurePolicy::KeepPartial).unwrap();
        assert_eq!(tests.len(), 2);
    }

    #[test]
    fn policy_parsing() {
        assert_eq!(
            FailurePolicy::parse("empty-first-page"),
            Some(FailurePolicy::EmptyFirstPage)
        );
        assert_eq!(FailurePolicy::parse("strict"), Some(FailurePolicy::Strict));
        assert_eq!(
            FailurePolicy::parse("keep-partial"),
            Some(FailurePolicy::KeepPartial)
        );
        assert_eq!(FailurePolicy::parse("retry"), None);
    }
}
