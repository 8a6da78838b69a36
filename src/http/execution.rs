//! Single SPARQL request over HTTP GET

use super::{TransportError, TransportResult};
use crate::sparql::{JsonParser, QueryResults};
use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Longest URL sent to an endpoint
pub const MAX_URL_LENGTH: usize = 2000;

/// Result format requested from the endpoint
pub const DEFAULT_FORMAT: &str = "application/sparql-results+json";

/// Timeout passed to the endpoint as the `timeout` parameter
pub const DEFAULT_TIMEOUT_MS: u64 = 30000;

/// Characters left alone by `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Request parameters sent alongside the query.
///
/// `timeout_ms` and `format` are optional so that an explicitly chosen
/// value, even one equal to the default, wins in [`merge`](Self::merge).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Sent as `timeout`, [`DEFAULT_TIMEOUT_MS`] when unset; not enforced locally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Sent as `format`, [`DEFAULT_FORMAT`] when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Additional parameters; same-named keys override the defaults
    pub params: IndexMap<String, String>,
}

impl ExecutionConfig {
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Effective timeout
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    /// Effective result format
    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_FORMAT)
    }

    /// Copy of `self` with everything set in `overrides` layered on top
    pub fn merge(&self, overrides: &ExecutionConfig) -> ExecutionConfig {
        let mut merged = self.clone();
        if let Some(timeout_ms) = overrides.timeout_ms {
            merged.timeout_ms = Some(timeout_ms);
        }
        if let Some(format) = &overrides.format {
            merged.format = Some(format.clone());
        }
        for (name, value) in &overrides.params {
            merged.params.insert(name.clone(), value.clone());
        }
        merged
    }
}

/// Executes one rendered query string against an endpoint
#[derive(Debug, Clone)]
pub struct QueryExecution {
    query: String,
    http_client: Client,
}

impl QueryExecution {
    pub fn new(query: impl Into<String>) -> Self {
        Self::with_client(query, Client::new())
    }

    /// Reuse an existing HTTP client
    pub fn with_client(query: impl Into<String>, http_client: Client) -> Self {
        Self {
            query: query.into(),
            http_client,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Updates go out under the `update` parameter instead of `query`
    pub fn is_update(&self) -> bool {
        self.query.contains("INSERT DATA") || self.query.contains("DELETE")
    }

    /// Defaults, then `config.params`, then the query itself
    pub fn query_params(&self, config: &ExecutionConfig) -> IndexMap<String, String> {
        let mut params = IndexMap::new();
        params.insert("timeout".to_string(), config.timeout_ms().to_string());
        params.insert("format".to_string(), config.format().to_string());
        for (name, value) in &config.params {
            params.insert(name.clone(), value.clone());
        }
        let key = if self.is_update() { "update" } else { "query" };
        params.insert(key.to_string(), self.query.clone());
        params
    }

    /// `base?k1=v1&k2=v2` with components percent-encoded
    pub fn build_url(base: &str, params: &IndexMap<String, String>) -> String {
        let query_string = params
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(name, COMPONENT),
                    utf8_percent_encode(value, COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", base, query_string)
    }

    /// Build the request URL, enforcing [`MAX_URL_LENGTH`]
    pub fn prepare(&self, endpoint_url: &str, config: &ExecutionConfig) -> TransportResult<String> {
        if endpoint_url.is_empty() {
            return Err(TransportError::InvalidEndpoint(
                "Endpoint must be a non-empty url".to_string(),
            ));
        }

        let url = Self::build_url(endpoint_url, &self.query_params(config));
        if url.len() > MAX_URL_LENGTH {
            return Err(TransportError::QueryTooLong { length: url.len() });
        }
        Ok(url)
    }

    /// Send the request and return the response body
    pub async fn execute_raw(
        &self,
        endpoint_url: &str,
        config: &ExecutionConfig,
    ) -> TransportResult<String> {
        let url = self.prepare(endpoint_url, config)?;
        debug!("GET {} ({} chars)", endpoint_url, url.len());

        let response = self
            .http_client
            .get(&url)
            .header(CONTENT_TYPE, DEFAULT_FORMAT)
            .header(ACCEPT, config.format())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("SPARQL endpoint {} returned {}", endpoint_url, status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Received {} bytes from {}", body.len(), endpoint_url);
        Ok(body)
    }

    /// Send the request and normalize the SPARQL/JSON response
    pub async fn execute(
        &self,
        endpoint_url: &str,
        config: &ExecutionConfig,
    ) -> TransportResult<QueryResults> {
        let body = self.execute_raw(endpoint_url, config).await?;
        let results = JsonParser::new(&body)?.parse()?;
        Ok(results)
    }
}
