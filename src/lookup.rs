//! Keyword lookup client for the company search API.
//!
//! Used by the verification pass to re-check stored BINs against an
//! independent provider. The response envelope is
//! `{"status": bool, "data": {"count_all": n, "result": [...]}}`.

use crate::config::EndpointsConfig;
use crate::error::{Error, FetchError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Envelope returned by the search endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchResponse {
    /// Whether the provider considers the request successful
    #[serde(default)]
    pub status: bool,

    /// Search payload; empty on failed requests
    #[serde(default)]
    pub data: SearchData,
}

/// Search payload inside the response envelope.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchData {
    /// Total number of matches known to the provider
    #[serde(default)]
    pub count_all: i64,

    /// The returned page of matches
    #[serde(default)]
    pub result: Vec<SearchHit>,
}

/// One company match from the search endpoint.
///
/// Every field is defaulted: the provider omits fields freely.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchHit {
    /// Business identification number
    #[serde(default)]
    pub biin: String,

    /// Company name
    #[serde(default)]
    pub name: String,

    /// Registered address
    #[serde(default)]
    pub address: String,

    /// Director full name
    #[serde(default)]
    pub director_name: String,

    /// Status label
    #[serde(default)]
    pub status: String,

    /// Whether the company is flagged inactive
    #[serde(default)]
    pub is_inactive: bool,

    /// Provider trust flag
    #[serde(default)]
    pub trustworthy: bool,
}

/// The search surface the verifier depends on.
///
/// Implemented by [`LookupClient`] for the real API and by test doubles in
/// verifier tests.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Search companies by keyword (name, director, or BIN).
    async fn search(&self, keyword: &str) -> Result<SearchResponse>;
}

/// HTTP client for the keyword search endpoint.
pub struct LookupClient {
    http_client: reqwest::Client,
    endpoints: EndpointsConfig,
}

impl LookupClient {
    /// Create a client with its own connection pool.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(endpoints: EndpointsConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(endpoints.lookup_timeout)
            .user_agent(&endpoints.user_agent)
            .pool_max_idle_per_host(endpoints.pool_max_idle_per_host)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoints,
        })
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(http_client: reqwest::Client, endpoints: EndpointsConfig) -> Self {
        Self {
            http_client,
            endpoints,
        }
    }

    /// Find a company by exact BIN match.
    ///
    /// Searches by the BIN as a keyword, then filters the hits for an exact
    /// `biin` match — a keyword search may return fuzzy matches.
    pub async fn find_by_bin(&self, bin: &str) -> Result<Option<SearchHit>> {
        let response = self.search(bin).await?;
        if !response.status || response.data.count_all == 0 {
            return Ok(None);
        }
        Ok(response.data.result.into_iter().find(|hit| hit.biin == bin))
    }
}

#[async_trait]
impl SearchApi for LookupClient {
    async fn search(&self, keyword: &str) -> Result<SearchResponse> {
        let url = format!(
            "{}/data/search?most_viewed_companies=0&keyword={}",
            self.endpoints.lookup_base_url.trim_end_matches('/'),
            urlencoding::encode(keyword)
        );
        debug!(keyword = keyword, "Searching lookup API");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            }
            .into());
        }

        let parsed = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, &e))?;

        Ok(parsed)
    }
}
