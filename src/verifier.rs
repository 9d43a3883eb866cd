//! Verification pass: re-check stored BINs against the lookup API.
//!
//! A fixed-size worker pool consumes the static entity list with unordered
//! completion. Per-entity lookup failures are logged and counted as "not
//! confirmed"; the result set is purely additive and nothing ever escapes
//! [`Verifier::verify`] as an error.

use crate::entity::Entity;
use crate::lookup::SearchApi;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Accounting for one verification pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifySummary {
    /// Entities checked
    pub checked: u64,
    /// Entities confirmed by exact BIN match
    pub confirmed: u64,
    /// Lookups that failed transiently (counted as not confirmed)
    pub lookup_failures: u64,
}

/// Outcome of a verification pass: the confirmed identities plus counters.
///
/// The confirmed set, together with [`crate::db::Database::list_companies`],
/// is the only data the downstream export step reads.
#[derive(Clone, Debug, Default)]
pub struct VerifyReport {
    /// BINs confirmed to exist at the lookup provider
    pub confirmed_bins: HashSet<String>,
    /// Pass counters
    pub summary: VerifySummary,
}

/// Bounded-parallel existence checker over already-stored entities.
pub struct Verifier {
    search: Arc<dyn SearchApi>,
    concurrency: usize,
}

impl Verifier {
    /// Create a verifier over an injected search client.
    ///
    /// `concurrency` caps in-flight lookup calls; it is clamped to at
    /// least 1.
    pub fn new(search: Arc<dyn SearchApi>, concurrency: usize) -> Self {
        Self {
            search,
            concurrency: concurrency.max(1),
        }
    }

    /// Check every entity against the lookup API and collect confirmed BINs.
    ///
    /// An entity is confirmed when the search envelope reports success and
    /// contains a hit whose `biin` matches exactly. Failed lookups are
    /// logged, counted, and treated as not confirmed.
    pub async fn verify(&self, entities: &[Entity]) -> VerifyReport {
        info!(
            entities = entities.len(),
            concurrency = self.concurrency,
            "Starting verification pass"
        );

        let results: Vec<(String, Option<bool>)> = stream::iter(entities)
            .map(|entity| {
                let search = Arc::clone(&self.search);
                let bin = entity.bin.clone();
                async move {
                    match search.search(&bin).await {
                        Ok(response) => {
                            let confirmed = response.status
                                && response.data.result.iter().any(|hit| hit.biin == bin);
                            debug!(bin = %bin, confirmed = confirmed, "Lookup completed");
                            (bin, Some(confirmed))
                        }
                        Err(e) => {
                            warn!(bin = %bin, error = %e, "Lookup failed");
                            (bin, None)
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = VerifyReport::default();
        report.summary.checked = results.len() as u64;
        for (bin, outcome) in results {
            match outcome {
                Some(true) => {
                    report.confirmed_bins.insert(bin);
                    report.summary.confirmed += 1;
                }
                Some(false) => {}
                None => report.summary.lookup_failures += 1,
            }
        }

        info!(
            checked = report.summary.checked,
            confirmed = report.summary.confirmed,
            lookup_failures = report.summary.lookup_failures,
            "Verification pass finished"
        );

        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::lookup::{SearchData, SearchHit, SearchResponse};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted search double: per-BIN confirmation or failure, with a
    /// high-water mark of concurrent calls.
    struct FakeSearch {
        known_bins: HashSet<String>,
        failing_bins: HashSet<String>,
        fuzzy_hits: HashMap<String, String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeSearch {
        fn new(known: &[&str], failing: &[&str]) -> Self {
            Self {
                known_bins: known.iter().map(|s| s.to_string()).collect(),
                failing_bins: failing.iter().map(|s| s.to_string()).collect(),
                fuzzy_hits: HashMap::new(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchApi for FakeSearch {
        async fn search(&self, keyword: &str) -> crate::Result<SearchResponse> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing_bins.contains(keyword) {
                return Err(FetchError::Timeout {
                    url: format!("fake://search/{}", keyword),
                }
                .into());
            }

            let mut result = Vec::new();
            if self.known_bins.contains(keyword) {
                result.push(SearchHit {
                    biin: keyword.to_string(),
                    ..Default::default()
                });
            }
            if let Some(other) = self.fuzzy_hits.get(keyword) {
                result.push(SearchHit {
                    biin: other.clone(),
                    ..Default::default()
                });
            }

            Ok(SearchResponse {
                status: true,
                data: SearchData {
                    count_all: result.len() as i64,
                    result,
                },
            })
        }
    }

    fn entities(bins: &[&str]) -> Vec<Entity> {
        bins.iter()
            .map(|bin| Entity {
                bin: bin.to_string(),
                ..Default::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_confirms_only_found_bins_and_absorbs_failures() {
        // 10 entities: 4 confirmed, 2 transient lookup failures, 4 unknown
        let stored = entities(&["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);
        let search = FakeSearch::new(&["1", "3", "5", "7"], &["2", "4"]);

        let verifier = Verifier::new(Arc::new(search) as Arc<dyn SearchApi>, 3);
        let report = verifier.verify(&stored).await;

        let expected: HashSet<String> =
            ["1", "3", "5", "7"].iter().map(|s| s.to_string()).collect();
        assert_eq!(report.confirmed_bins, expected);
        assert_eq!(report.summary.checked, 10);
        assert_eq!(report.summary.confirmed, 4);
        assert_eq!(report.summary.lookup_failures, 2);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let stored = entities(&["1", "2", "3", "4", "5", "6", "7", "8"]);
        let search = Arc::new(FakeSearch::new(&["1"], &[]));

        let verifier = Verifier::new(Arc::clone(&search) as Arc<dyn SearchApi>, 2);
        verifier.verify(&stored).await;

        assert!(search.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_fuzzy_hits_are_not_confirmations() {
        // The lookup returns a near-miss company; only exact BIN matches count
        let stored = entities(&["111111111111"]);
        let mut search = FakeSearch::new(&[], &[]);
        search
            .fuzzy_hits
            .insert("111111111111".to_string(), "111111111112".to_string());

        let verifier = Verifier::new(Arc::new(search) as Arc<dyn SearchApi>, 1);
        let report = verifier.verify(&stored).await;
        assert!(report.confirmed_bins.is_empty());
        assert_eq!(report.summary.confirmed, 0);
    }

    #[tokio::test]
    async fn test_empty_input_is_empty_report() {
        let search = FakeSearch::new(&[], &[]);
        let verifier = Verifier::new(Arc::new(search) as Arc<dyn SearchApi>, 4);
        let report = verifier.verify(&[]).await;
        assert_eq!(report.summary.checked, 0);
        assert!(report.confirmed_bins.is_empty());
    }
}
