//! Registry API client: paginated company listing and per-BIN detail fetch.
//!
//! Both calls share one pooled `reqwest::Client`. The listing fetch is a
//! single-attempt primitive that surfaces transient failures as
//! [`FetchError`] — retry and skip policy belongs to the crawler. The detail
//! fetch absorbs every failure into `None`, which extraction accepts as a
//! valid "listed but undetailed" input.

use crate::config::EndpointsConfig;
use crate::error::{Error, FetchError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// The registry provider surface the crawler depends on.
///
/// Implemented by [`RegistryClient`] for the real API and by test doubles
/// in crawler tests.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Fetch one page of the company listing.
    ///
    /// Returns the raw listing entries; an empty vector means the provider
    /// has no more data. Fails with [`Error::Fetch`] on network errors,
    /// timeouts and non-2xx responses.
    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<Vec<Value>>;

    /// Fetch the rich detail payload for one company.
    ///
    /// Single attempt with an explicit timeout. Any failure — network,
    /// timeout, bad status, undecodable body — is logged and absorbed into
    /// `None`.
    async fn fetch_detail(&self, bin: &str, language: &str) -> Option<Value>;
}

/// HTTP client for the registry listing and detail endpoints.
pub struct RegistryClient {
    /// Shared, pool-limited HTTP client
    http_client: reqwest::Client,

    /// Endpoint URLs, headers and timeouts
    endpoints: EndpointsConfig,
}

impl RegistryClient {
    /// Create a client with its own connection pool.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(endpoints: EndpointsConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(endpoints.request_timeout)
            .user_agent(&endpoints.user_agent)
            .pool_max_idle_per_host(endpoints.pool_max_idle_per_host)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoints,
        })
    }

    /// Create a client around an existing `reqwest::Client`, sharing its
    /// connection pool with other components.
    pub fn with_client(http_client: reqwest::Client, endpoints: EndpointsConfig) -> Self {
        Self {
            http_client,
            endpoints,
        }
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/GetCompanyListAsync",
            self.endpoints.registry_base_url.trim_end_matches('/')
        )
    }

    fn detail_url(&self, bin: &str, language: &str) -> String {
        format!(
            "{}/CompanyFullInfo?id={}&lang={}",
            self.endpoints.registry_base_url.trim_end_matches('/'),
            bin,
            language
        )
    }
}

#[async_trait]
impl RegistryApi for RegistryClient {
    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<Vec<Value>> {
        let url = self.listing_url();
        debug!(page = page, page_size = page_size, "Fetching listing page");

        // Empty category filters = "all companies"
        let body = json!({
            "page": page,
            "pageSize": page_size,
            "market": {},
            "tax": {},
            "krp": [],
            "oked": [],
            "kato": [],
        });

        let mut request = self
            .http_client
            .post(&url)
            .header("Accept", "application/json, text/plain, */*")
            .json(&body);
        if let Some(referer) = &self.endpoints.referer {
            request = request.header("Referer", referer.as_str());
        }

        let response = request
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

        let payload: Value = response
            .json()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, &e))?;

        // A well-formed response without "results" is an empty page
        let results = payload
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        debug!(page = page, entries = results.len(), "Listing page fetched");
        Ok(results)
    }

    async fn fetch_detail(&self, bin: &str, language: &str) -> Option<Value> {
        let url = self.detail_url(bin, language);

        let mut request = self
            .http_client
            .get(&url)
            .header("Accept", "application/json, text/plain, */*");
        if let Some(referer) = &self.endpoints.referer {
            request = request.header("Referer", referer.as_str());
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(bin = bin, error = %e, "Detail request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(bin = bin, status = status.as_u16(), "Detail request returned bad status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(bin = bin, error = %e, "Detail response body was not valid JSON");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_endpoints(base: &str) -> EndpointsConfig {
        EndpointsConfig {
            registry_base_url: base.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_page_parses_results() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/GetCompanyListAsync"))
            .and(body_partial_json(json!({"page": 3, "pageSize": 50})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"bin": "111"}, {"bin": "222"}],
                "total": 2
            })))
            .mount(&mock_server)
            .await;

        let client = RegistryClient::new(test_endpoints(&mock_server.uri())).unwrap();
        let entries = client.fetch_page(3, 50).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["bin"], "111");
    }

    #[tokio::test]
    async fn test_fetch_page_missing_results_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/GetCompanyListAsync"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0})))
            .mount(&mock_server)
            .await;

        let client = RegistryClient::new(test_endpoints(&mock_server.uri())).unwrap();
        let entries = client.fetch_page(1, 50).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_page_bad_status_is_fetch_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/GetCompanyListAsync"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = RegistryClient::new(test_endpoints(&mock_server.uri())).unwrap();
        let err = client.fetch_page(1, 50).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Fetch(FetchError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_detail_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/CompanyFullInfo"))
            .and(query_param("id", "123456789012"))
            .and(query_param("lang", "ru"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "basicInfo": {"titleRu": "Test LLC"}
            })))
            .mount(&mock_server)
            .await;

        let client = RegistryClient::new(test_endpoints(&mock_server.uri())).unwrap();
        let detail = client.fetch_detail("123456789012", "ru").await.unwrap();
        assert_eq!(detail["basicInfo"]["titleRu"], "Test LLC");
    }

    #[tokio::test]
    async fn test_fetch_detail_server_error_is_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/CompanyFullInfo"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = RegistryClient::new(test_endpoints(&mock_server.uri())).unwrap();
        assert!(client.fetch_detail("123", "ru").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_detail_invalid_body_is_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/CompanyFullInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&mock_server)
            .await;

        let client = RegistryClient::new(test_endpoints(&mock_server.uri())).unwrap();
        assert!(client.fetch_detail("123", "ru").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_detail_connection_refused_is_absent() {
        // Port 1 should refuse connections
        let client = RegistryClient::new(test_endpoints("http://127.0.0.1:1")).unwrap();
        assert!(client.fetch_detail("123", "ru").await.is_none());
    }
}
