//! Configuration types for registry-harvester

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Crawl behavior configuration (pagination, batching, pacing)
///
/// Groups settings that control how the listing crawl is paced.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Number of listing entries requested per page (default: 50)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Hard ceiling on page numbers; the crawl never goes past this
    /// even if the provider keeps returning results (default: 500000)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Number of entities processed concurrently within one batch (default: 5)
    ///
    /// This bounds in-flight detail requests: exactly one batch is in flight
    /// at a time, with a full barrier between batches.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches, for provider rate-limit courtesy (default: 1 second)
    #[serde(default = "default_batch_pause", with = "duration_serde")]
    pub batch_pause: Duration,

    /// Language code passed to the detail API (default: "ru")
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            batch_size: default_batch_size(),
            batch_pause: default_batch_pause(),
            language: default_language(),
        }
    }
}

/// Remote API endpoints and static request headers
///
/// Groups everything needed to address the registry and lookup providers.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Base URL of the registry API (listing and detail endpoints)
    #[serde(default = "default_registry_base_url")]
    pub registry_base_url: String,

    /// Base URL of the keyword lookup API
    #[serde(default = "default_lookup_base_url")]
    pub lookup_base_url: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Referer header sent to the registry API
    #[serde(default)]
    pub referer: Option<String>,

    /// Per-request timeout for listing and detail fetches (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Per-request timeout for lookup searches (default: 10 seconds)
    #[serde(default = "default_lookup_timeout", with = "duration_serde")]
    pub lookup_timeout: Duration,

    /// Maximum idle connections kept per host in the shared HTTP pool (default: 5)
    #[serde(default = "default_pool_per_host")]
    pub pool_max_idle_per_host: usize,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            registry_base_url: default_registry_base_url(),
            lookup_base_url: default_lookup_base_url(),
            user_agent: default_user_agent(),
            referer: None,
            request_timeout: default_request_timeout(),
            lookup_timeout: default_lookup_timeout(),
            pool_max_idle_per_host: default_pool_per_host(),
        }
    }
}

/// Data storage configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database path (default: "./companies.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Verification pass configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Maximum concurrent lookup calls during verification (default: 10)
    #[serde(default = "default_verify_concurrency")]
    pub concurrency: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            concurrency: default_verify_concurrency(),
        }
    }
}

/// Retry configuration for failed listing-page fetches
///
/// With `max_attempts = 0` a failed page is skipped immediately, which is
/// the behavior of treating any listing failure as a gap in the crawl.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial try (default: 2)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for registry-harvester
///
/// Fields are organized into logical sub-configs:
/// - [`crawl`](CrawlConfig) — pagination, batching, pacing
/// - [`endpoints`](EndpointsConfig) — API URLs, headers, timeouts
/// - [`persistence`](PersistenceConfig) — database path
/// - [`verify`](VerifyConfig) — verification concurrency
/// - [`retry`](RetryConfig) — listing-page retry policy
///
/// Sub-config fields are flattened for serialization so the JSON/TOML
/// format stays flat, except `persistence` which keys its own section.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Crawl pacing settings
    #[serde(flatten)]
    pub crawl: CrawlConfig,

    /// Remote API endpoints and headers
    #[serde(flatten)]
    pub endpoints: EndpointsConfig,

    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Verification pass settings
    #[serde(flatten)]
    pub verify: VerifyConfig,

    /// Listing-page retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Validate settings that would make a run nonsensical.
    pub fn validate(&self) -> crate::Result<()> {
        if self.crawl.batch_size == 0 {
            return Err(crate::Error::Config {
                message: "batch_size must be at least 1".to_string(),
                key: Some("crawl.batch_size".to_string()),
            });
        }
        if self.crawl.page_size == 0 {
            return Err(crate::Error::Config {
                message: "page_size must be at least 1".to_string(),
                key: Some("crawl.page_size".to_string()),
            });
        }
        if self.verify.concurrency == 0 {
            return Err(crate::Error::Config {
                message: "verify concurrency must be at least 1".to_string(),
                key: Some("verify.concurrency".to_string()),
            });
        }
        Ok(())
    }
}

fn default_page_size() -> usize {
    50
}

fn default_max_pages() -> u32 {
    500_000
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_pause() -> Duration {
    Duration::from_secs(1)
}

fn default_language() -> String {
    "ru".to_string()
}

fn default_registry_base_url() -> String {
    "https://apiba.prgapp.kz".to_string()
}

fn default_lookup_base_url() -> String {
    "https://pk-api.adata.kz/api/v1".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_lookup_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_pool_per_host() -> usize {
    5
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./companies.db")
}

fn default_verify_concurrency() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
