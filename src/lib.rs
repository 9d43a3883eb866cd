//! # registry-harvester
//!
//! Harvester for a public company registry: walks the paginated company
//! listing, enriches each entry with a per-company detail fetch, and stores
//! the result in SQLite keyed by BIN. A separate verification pass re-checks
//! stored BINs against an independent lookup provider.
//!
//! ## Design Philosophy
//!
//! registry-harvester is designed to be:
//! - **Defensive** - upstream payloads vary in shape; extraction never panics
//! - **Idempotent** - reruns converge, rows are replaced wholesale by BIN
//! - **Polite** - bounded batches with a pause between them, bounded lookup
//!   concurrency
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use registry_harvester::{Config, Crawler, Database, RegistryClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!
//!     let db = Arc::new(Database::new(&config.persistence.database_path).await?);
//!     let registry = Arc::new(RegistryClient::new(config.endpoints.clone())?);
//!
//!     let crawler = Crawler::new(registry, Arc::clone(&db), config)?;
//!     let summary = crawler.run().await;
//!     println!(
//!         "saved {} entities across {} pages",
//!         summary.entities_saved, summary.pages_processed
//!     );
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Listing crawl orchestration
pub mod crawler;
/// Database persistence layer
pub mod db;
/// Company entity and defensive extraction
pub mod entity;
/// Error types
pub mod error;
/// Keyword lookup API client
pub mod lookup;
/// Registry API client (listing and detail endpoints)
pub mod registry;
/// Retry logic with exponential backoff
pub mod retry;
/// Shape-tolerant JSON value access
pub mod soft;
/// Bounded-parallel BIN verification
pub mod verifier;

// Re-export commonly used types
pub use config::{
    Config, CrawlConfig, EndpointsConfig, PersistenceConfig, RetryConfig, VerifyConfig,
};
pub use crawler::{CrawlSummary, Crawler};
pub use db::Database;
pub use entity::Entity;
pub use error::{DatabaseError, Error, FetchError, Result};
pub use lookup::{LookupClient, SearchApi, SearchHit, SearchResponse};
pub use registry::{RegistryApi, RegistryClient};
pub use soft::SoftValue;
pub use verifier::{Verifier, VerifyReport, VerifySummary};
