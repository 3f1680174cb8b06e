//! HTTP client for the TMDB movie search endpoint.

use super::SearchApi;
use crate::domain::{Result, SearchError, SearchResponse};
use crate::Config;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::Instrument;
use url::Url;

const SEARCH_PATH: &str = "search/movie";

/// Searches movies over HTTP with bearer-token auth.
///
/// Every request is `GET {base_url}/search/movie?include_adult=false&query=…&page=…`.
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    endpoint: Url,
    auth_token: String,
    timeout: Duration,
}

impl TmdbClient {
    /// Builds a client from the configured base URL, token and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the base URL does not parse or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)
            .and_then(|base| base.join(SEARCH_PATH))
            .map_err(|e| SearchError::Config(format!("invalid base_url {:?}: {e}", config.base_url)))?;

        let timeout = config.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))?;

        tracing::debug!(endpoint = %endpoint, timeout_ms = timeout.as_millis(), "search client ready");

        Ok(Self {
            client,
            endpoint,
            auth_token: config.auth_token.clone(),
            timeout,
        })
    }

    /// Full request URL for `query` and `page`.
    #[must_use]
    pub fn search_url(&self, query: &str, page: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("include_adult", "false")
            .append_pair("query", query)
            .append_pair("page", &page.to_string());
        url
    }

    fn classify(&self, err: &reqwest::Error) -> SearchError {
        if err.is_timeout() {
            SearchError::Timeout(format!("timeout of {}ms exceeded", self.timeout.as_millis()))
        } else if err.is_decode() {
            SearchError::MalformedResponse(err.to_string())
        } else {
            SearchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl SearchApi for TmdbClient {
    async fn search_movies(&self, query: &str, page: u32) -> Result<SearchResponse> {
        let span = tracing::debug_span!("tmdb_search", query = %query, page = page);

        async move {
            let url = self.search_url(query, page);
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.auth_token)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| self.classify(&e))?;

            let status = response.status();
            if !status.is_success() {
                tracing::debug!(status = status.as_u16(), "search request rejected");
                return Err(SearchError::Network(format!(
                    "Request failed with status code {}",
                    status.as_u16()
                )));
            }

            let body: SearchResponse = response.json().await.map_err(|e| self.classify(&e))?;

            tracing::debug!(
                result_count = body.results.len(),
                total_pages = body.total_pages,
                "search page received"
            );
            Ok(body)
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
