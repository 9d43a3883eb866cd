//! Crawl orchestration: pagination, batching, and per-entity persistence.
//!
//! The crawler drives the listing from page 1 upward. Each page's entries
//! are processed in fixed-size batches: within a batch, detail fetch,
//! extraction and upsert run concurrently; the crawler waits for the whole
//! batch before starting the next one, then pauses briefly for provider
//! rate-limit courtesy. In-flight detail requests are therefore bounded by
//! the batch size at any instant.
//!
//! Failure policy: one entity's detail or store failure never aborts its
//! siblings; a failed listing page is retried a bounded number of times and
//! then skipped, accepting a gap over aborting the run. A run always
//! reaches pagination exhaustion or the page ceiling.

use crate::config::Config;
use crate::db::Database;
use crate::entity::Entity;
use crate::registry::RegistryApi;
use crate::retry::retry_with_backoff;
use crate::soft::SoftValue;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// End-of-run accounting for one crawl.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages whose listing fetch succeeded and whose entries were processed
    pub pages_processed: u32,
    /// Pages skipped after exhausting listing retries
    pub pages_failed: u32,
    /// Entities successfully upserted
    pub entities_saved: u64,
    /// Listing entries discarded for having no BIN
    pub entities_skipped: u64,
    /// Detail fetches that came back absent (entity still stored, undetailed)
    pub detail_failures: u64,
    /// Upserts that failed (entity lost for this run)
    pub store_failures: u64,
}

/// Atomic counters shared across the concurrent tasks of one batch.
#[derive(Default)]
struct CrawlCounters {
    entities_saved: AtomicU64,
    entities_skipped: AtomicU64,
    detail_failures: AtomicU64,
    store_failures: AtomicU64,
}

/// Drives the full acquisition pipeline: listing pages → detail fetches →
/// extraction → idempotent upserts.
///
/// The registry client and database handle are injected, so tests can run
/// the whole pipeline against in-memory doubles.
pub struct Crawler {
    registry: Arc<dyn RegistryApi>,
    db: Arc<Database>,
    config: Config,
}

impl Crawler {
    /// Create a crawler over an injected registry client and database.
    ///
    /// # Errors
    /// Returns a configuration error for nonsensical settings (zero batch
    /// or page size).
    pub fn new(registry: Arc<dyn RegistryApi>, db: Arc<Database>, config: Config) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            db,
            config,
        })
    }

    /// Run the crawl from page 1 to exhaustion or the page ceiling.
    ///
    /// Never fails mid-run: transient fetch and store errors are absorbed,
    /// counted, and summarized. Re-running is safe — upserts are
    /// idempotent, so a second pass converges to the same stored state.
    pub async fn run(&self) -> CrawlSummary {
        let counters = CrawlCounters::default();
        let mut pages_processed = 0u32;
        let mut pages_failed = 0u32;

        for page in 1..=self.config.crawl.max_pages {
            let entries = match self.fetch_page_with_retry(page).await {
                Ok(entries) => entries,
                Err(e) => {
                    // Deliberate at-most-once-per-page semantics: after
                    // retries, accept the gap and move on
                    warn!(page = page, error = %e, "Listing page failed, skipping");
                    pages_failed += 1;
                    continue;
                }
            };

            if entries.is_empty() {
                info!(page = page, "Provider returned empty page, crawl complete");
                break;
            }

            self.process_page(page, &entries, &counters).await;
            pages_processed += 1;
        }

        let summary = CrawlSummary {
            pages_processed,
            pages_failed,
            entities_saved: counters.entities_saved.load(Ordering::Relaxed),
            entities_skipped: counters.entities_skipped.load(Ordering::Relaxed),
            detail_failures: counters.detail_failures.load(Ordering::Relaxed),
            store_failures: counters.store_failures.load(Ordering::Relaxed),
        };

        info!(
            pages_processed = summary.pages_processed,
            pages_failed = summary.pages_failed,
            entities_saved = summary.entities_saved,
            entities_skipped = summary.entities_skipped,
            detail_failures = summary.detail_failures,
            store_failures = summary.store_failures,
            "Crawl finished"
        );

        summary
    }

    /// Fetch one listing page, retrying transient failures per the
    /// configured policy.
    async fn fetch_page_with_retry(&self, page: u32) -> crate::Result<Vec<Value>> {
        let page_size = self.config.crawl.page_size;
        retry_with_backoff(&self.config.retry, || {
            self.registry.fetch_page(page, page_size)
        })
        .await
    }

    /// Process one page's entries in fixed-size batches with a full
    /// barrier and pause between batches.
    async fn process_page(&self, page: u32, entries: &[Value], counters: &CrawlCounters) {
        debug!(page = page, entries = entries.len(), "Processing page");

        for batch in entries.chunks(self.config.crawl.batch_size) {
            let tasks = batch.iter().map(|entry| self.process_entry(entry, counters));
            futures::future::join_all(tasks).await;

            if !self.config.crawl.batch_pause.is_zero() {
                tokio::time::sleep(self.config.crawl.batch_pause).await;
            }
        }

        debug!(page = page, "Page processed");
    }

    /// Fetch, extract and persist one listing entry.
    ///
    /// Every failure here is local to this entity: an absent detail payload
    /// still produces a storable record, and a failed upsert is counted and
    /// logged without touching siblings.
    async fn process_entry(&self, entry: &Value, counters: &CrawlCounters) {
        let bin = SoftValue::key(Some(entry), "bin").as_str("");
        if bin.is_empty() {
            debug!("Skipping listing entry without BIN");
            counters.entities_skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let detail = self
            .registry
            .fetch_detail(&bin, &self.config.crawl.language)
            .await;
        if detail.is_none() {
            counters.detail_failures.fetch_add(1, Ordering::Relaxed);
        }

        let entity = Entity::from_raw(entry, detail.as_ref());
        match self.db.upsert_company(&entity).await {
            Ok(()) => {
                debug!(bin = %entity.bin, "Saved company");
                counters.entities_saved.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                error!(bin = %entity.bin, error = %e, "Failed to save company");
                counters.store_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
