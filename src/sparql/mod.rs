//! SPARQL 1.1 Query Results JSON support
//!
//! Parses the JSON result format returned by SPARQL endpoints into flat,
//! typed rows. Literal values are coerced through a
//! [`TypeTransformRegistry`] keyed by datatype IRI.
//!
//! # Example
//!
//! ```rust
//! use sparqler::sparql::{JsonParser, SolutionValue};
//!
//! let body = r#"{
//!     "head": { "vars": ["name", "age"] },
//!     "results": { "bindings": [
//!         { "name": { "type": "literal", "value": "Alice", "xml:lang": "en" },
//!           "age":  { "type": "literal", "value": "30",
//!                     "datatype": "http://www.w3.org/2001/XMLSchema#integer" } }
//!     ] }
//! }"#;
//!
//! let results = JsonParser::new(body).unwrap().parse().unwrap();
//! let rows = results.as_select().unwrap();
//! assert_eq!(rows.results[0]["name"].language, "en");
//! assert_eq!(rows.results[0]["age"].value, SolutionValue::Integer(30));
//! ```

mod parser;
mod results;
mod transform;

pub use parser::{AskParser, Binding, Head, JsonParser, ResponseParser, SelectParser, Term, TermKind};
pub use results::{
    AskResults, FlatBinding, QueryResults, ResolvedSolution, SelectResults, SolutionValue, UNKNOWN,
    URI_DATATYPE,
};
pub use transform::{
    default_registry, identity, parse_decimal, parse_integer, parse_temporal, TypeTransform,
    TypeTransformRegistry,
};

use thiserror::Error;

/// SPARQL result parsing errors
#[derive(Error, Debug)]
pub enum SparqlError {
    /// Body is not valid JSON
    #[error("Malformed response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// Decoded payload lacks the shape expected for its kind
    #[error("Attribute access failure in {kind} response: {source}")]
    AttributeAccess {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type SparqlResult<T> = Result<T, SparqlError>;
