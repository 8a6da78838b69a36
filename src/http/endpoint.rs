//! SPARQL endpoint configuration

use super::execution::{ExecutionConfig, QueryExecution};
use super::TransportResult;
use crate::query::Query;
use crate::rdf::PrefixMap;
use crate::sparql::QueryResults;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Endpoint configuration errors
#[derive(Error, Debug)]
pub enum EndpointError {
    /// No url configured
    #[error("Endpoint requires an url")]
    MissingUrl,

    /// YAML configuration error
    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON configuration error
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EndpointResult<T> = Result<T, EndpointError>;

/// Where and how queries are sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Endpoint URL
    pub url: String,
    /// Named graph, sent as the `graph` parameter when non-empty
    pub graph: String,
    /// Prefixes declared in front of every query
    pub prefixes: PrefixMap,
    /// Request parameters
    pub execution: ExecutionConfig,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(s: &str) -> EndpointResult<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> EndpointResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a `.json` file, or YAML for any other extension
    pub fn load(path: impl AsRef<Path>) -> EndpointResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        info!("Loading endpoint configuration from {:?}", path);

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }
}

/// Immutable SPARQL endpoint handle.
///
/// The `with_*` / `add_*` methods return a new `Endpoint`; the HTTP client
/// is shared between copies.
#[derive(Debug, Clone)]
pub struct Endpoint {
    config: EndpointConfig,
    http_client: Client,
}

impl Endpoint {
    /// Create an endpoint; fails if the url is empty
    pub fn new(config: EndpointConfig) -> EndpointResult<Self> {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: EndpointConfig, http_client: Client) -> EndpointResult<Self> {
        if config.url.is_empty() {
            return Err(EndpointError::MissingUrl);
        }
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn from_url(url: impl Into<String>) -> EndpointResult<Self> {
        Self::new(EndpointConfig::new(url))
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn graph(&self) -> &str {
        &self.config.graph
    }

    pub fn prefixes(&self) -> &PrefixMap {
        &self.config.prefixes
    }

    fn with_config(&self, config: EndpointConfig) -> Endpoint {
        Endpoint {
            config,
            http_client: self.http_client.clone(),
        }
    }

    pub fn with_url(&self, url: impl Into<String>) -> EndpointResult<Endpoint> {
        let config = EndpointConfig {
            url: url.into(),
            ..self.config.clone()
        };
        Self::with_client(config, self.http_client.clone())
    }

    pub fn with_graph(&self, graph: impl Into<String>) -> Endpoint {
        self.with_config(EndpointConfig {
            graph: graph.into(),
            ..self.config.clone()
        })
    }

    /// Replace all prefixes
    pub fn with_prefixes(&self, prefixes: PrefixMap) -> Endpoint {
        self.with_config(EndpointConfig {
            prefixes,
            ..self.config.clone()
        })
    }

    /// Append prefixes; rebinding an existing name replaces its IRI
    pub fn add_prefixes(&self, prefixes: &PrefixMap) -> Endpoint {
        self.with_prefixes(self.config.prefixes.merge(prefixes))
    }

    pub fn add_prefix(&self, prefix: &str, iri: &str) -> Endpoint {
        self.add_prefixes(&PrefixMap::new().with_prefix(prefix, iri))
    }

    pub fn with_execution(&self, execution: ExecutionConfig) -> Endpoint {
        self.with_config(EndpointConfig {
            execution,
            ..self.config.clone()
        })
    }

    /// Request parameters including the named graph
    pub fn execution_config(&self) -> ExecutionConfig {
        if self.config.graph.is_empty() {
            self.config.execution.clone()
        } else {
            self.config
                .execution
                .clone()
                .with_param("graph", self.config.graph.clone())
        }
    }

    /// Prefix the query and bind it to this endpoint's HTTP client
    pub fn prepare(&self, query: impl Into<Query>) -> QueryExecution {
        let query = query.into().add_prefixes(&self.config.prefixes);
        QueryExecution::with_client(query.into_string(), self.http_client.clone())
    }

    /// Run a query (or raw query text) against this endpoint
    pub async fn execute(&self, query: impl Into<Query>) -> TransportResult<QueryResults> {
        let execution = self.prepare(query);
        debug!("Executing query against {}", self.config.url);
        execution
            .execute(&self.config.url, &self.execution_config())
            .await
    }

    /// Like [`execute`](Self::execute) but returns the raw response body
    pub async fn execute_raw(&self, query: impl Into<Query>) -> TransportResult<String> {
        let execution = self.prepare(query);
        execution
            .execute_raw(&self.config.url, &self.execution_config())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Endpoint {
        Endpoint::from_url("myurl").unwrap()
    }

    #[test]
    fn test_sets_configs() {
        let config = EndpointConfig {
            url: "myurl".to_string(),
            graph: "mygraph".to_string(),
            prefixes: PrefixMap::new().with_prefix("pre", "fix"),
            ..EndpointConfig::default()
        };
        let endpoint = Endpoint::new(config).unwrap();

        assert_eq!(endpoint.url(), "myurl");
        assert_eq!(endpoint.graph(), "mygraph");
        assert_eq!(endpoint.prefixes().get_iri("pre").unwrap(), "fix");
    }

    #[test]
    fn test_missing_url() {
        assert!(matches!(Endpoint::from_url(""), Err(EndpointError::MissingUrl)));
        assert!(matches!(instance().with_url(""), Err(EndpointError::MissingUrl)));
    }

    #[test]
    fn test_with_url_and_graph() {
        let base = instance();
        let changed = base.with_url("other").unwrap().with_graph("mygraph");

        assert_eq!(changed.url(), "other");
        assert_eq!(changed.graph(), "mygraph");
        assert_eq!(base.url(), "myurl");
        assert_eq!(base.graph(), "");
    }

    #[test]
    fn test_add_prefixes() {
        let endpoint = instance()
            .add_prefixes(&PrefixMap::new().with_prefix("pre", "fix"))
            .add_prefix("foo", "bar");

        let pairs: Vec<_> = endpoint.prefixes().iter().collect();
        assert_eq!(pairs, vec![("pre", "fix"), ("foo", "bar")]);
    }

    #[test]
    fn test_with_prefixes_replaces() {
        let endpoint = instance()
            .add_prefix("a", "http://a/")
            .with_prefixes(PrefixMap::new().with_prefix("b", "http://b/"));

        assert_eq!(endpoint.prefixes().len(), 1);
        assert!(endpoint.prefixes().get_iri("a").is_err());
    }

    #[test]
    fn test_execution_config_carries_graph() {
        assert!(!instance().execution_config().params.contains_key("graph"));

        let config = instance().with_graph("http://example.org/g").execution_config();
        assert_eq!(config.params["graph"], "http://example.org/g");
    }

    #[test]
    fn test_prepare_adds_prefixes() {
        let execution = instance()
            .add_prefix("foaf", "http://xmlns.com/foaf/0.1/")
            .prepare("SELECT ?n WHERE { ?s foaf:name ?n }");

        assert_eq!(
            execution.query(),
            "PREFIX foaf: <http://xmlns.com/foaf/0.1/>.\nSELECT ?n WHERE { ?s foaf:name ?n }"
        );
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
url: http://dbpedia.org/sparql
graph: http://dbpedia.org
prefixes:
  dbo: http://dbpedia.org/ontology/
  dbr: http://dbpedia.org/resource/
execution:
  timeout_ms: 5000
  params:
    debug: "on"
"#;
        let config = EndpointConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.url, "http://dbpedia.org/sparql");
        assert_eq!(config.prefixes.len(), 2);
        assert_eq!(config.execution.timeout_ms, Some(5000));
        assert_eq!(config.execution.format(), "application/sparql-results+json");
        assert_eq!(config.execution.params["debug"], "on");
    }

    #[test]
    fn test_config_from_json() {
        let config = EndpointConfig::from_json_str(r#"{"url": "http://x/sparql"}"#).unwrap();
        assert_eq!(config.url, "http://x/sparql");
        assert_eq!(config.execution, ExecutionConfig::default());
        assert!(matches!(
            EndpointConfig::from_json_str("[]"),
            Err(EndpointError::Json(_))
        ));
    }
}
