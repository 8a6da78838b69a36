//! Sparqler
//!
//! Client-side SPARQL toolkit: build queries from immutable templates,
//! send them to an HTTP endpoint and normalize the SPARQL/JSON results
//! into flat, typed rows.
//!
//! The [`query`] module holds immutable `?name` placeholder substitution.
//! ASK/SELECT result parsing with datatype coercion lives in [`sparql`],
//! endpoint configuration and query execution in [`http`], and prefix
//! maps and XSD datatype IRIs in [`rdf`].
//!
//! ## Example Usage
//!
//! ```rust
//! use sparqler::{JsonParser, Query, QueryExecution, ExecutionConfig};
//!
//! let query = Query::new("ASK { ?s a ?type }")
//!     .set_uri("type", "http://xmlns.com/foaf/0.1/Person");
//! assert_eq!(query.query_string(), "ASK { ?s a <http://xmlns.com/foaf/0.1/Person> }");
//!
//! // URL that would be requested
//! let url = QueryExecution::new(query.query_string())
//!     .prepare("http://dbpedia.org/sparql", &ExecutionConfig::default())
//!     .unwrap();
//! assert!(url.starts_with("http://dbpedia.org/sparql?timeout=30000"));
//!
//! // Normalizing the response body
//! let results = JsonParser::new(r#"{"head": {}, "boolean": true}"#)
//!     .unwrap()
//!     .parse()
//!     .unwrap();
//! assert_eq!(results.as_ask().map(|ask| ask.results), Some(true));
//! ```

#![warn(clippy::all)]

pub mod http;
pub mod query;
pub mod rdf;
pub mod sparql;

// Re-export main types for convenience
pub use query::{Language, Literal, Query, QueryError, QueryResult};

pub use sparql::{
    AskParser, AskResults, FlatBinding, JsonParser, QueryResults, ResolvedSolution, SelectParser,
    SelectResults, SolutionValue, SparqlError, SparqlResult, TypeTransformRegistry,
};

pub use http::{
    Endpoint, EndpointConfig, EndpointError, EndpointResult, ExecutionConfig, QueryExecution,
    TransportError, TransportResult,
};

pub use rdf::{PrefixError, PrefixMap};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
