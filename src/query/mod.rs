//! Immutable SPARQL query templates
//!
//! A [`Query`] wraps template text that uses `?name` placeholders. Every
//! setter returns a new `Query`; the receiver is left untouched, so a base
//! template can be shared and specialised many times.
//!
//! # Example
//!
//! ```rust
//! use sparqler::query::{Language, Query};
//!
//! let base = Query::new("SELECT * WHERE { ?s ?p ?o }");
//! let query = base
//!     .set_uri("s", "http://dbpedia.org/resource/Berlin")
//!     .set_parameter("p", "rdfs:label")
//!     .set_literal_with_language("o", "Berlin", Language::English)
//!     .add_prefix("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
//!
//! assert_eq!(
//!     query.query_string(),
//!     "PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>.\n\
//!      SELECT * WHERE { <http://dbpedia.org/resource/Berlin> rdfs:label 'Berlin'@en }"
//! );
//! assert_eq!(base.query_string(), "SELECT * WHERE { ?s ?p ?o }");
//! ```
//!
//! Substitution is purely textual. `?name` is replaced wherever it occurs,
//! including inside longer variable names and string literals, and in
//! multi-parameter setters a later parameter also matches text that an
//! earlier replacement introduced.

mod literal;

pub use literal::{Language, Literal};

use crate::http::{ExecutionConfig, QueryExecution, TransportResult};
use crate::rdf::PrefixMap;
use crate::sparql::QueryResults;
use std::fmt;
use thiserror::Error;

/// Query construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Template was not a string
    #[error("No valid query string passed to Query: {0}")]
    InvalidArgument(String),

    /// Literal value was not text, number or boolean
    #[error("Unsupported literal type: {0}")]
    UnsupportedLiteralType(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Immutable SPARQL query template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    query_string: String,
}

impl Query {
    /// Create a query from template text
    pub fn new(query_string: impl Into<String>) -> Self {
        Self {
            query_string: query_string.into(),
        }
    }

    /// The current query text
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn into_string(self) -> String {
        self.query_string
    }

    /// Replace every occurrence of `?name` in `query_string` with `value`.
    ///
    /// This is the only place substitution happens.
    pub fn replace_parameter(name: &str, value: &str, query_string: &str) -> String {
        let placeholder = format!("?{}", name);
        query_string.replace(&placeholder, value)
    }

    /// Substitute a single parameter with raw text
    pub fn set_parameter(&self, name: &str, value: impl AsRef<str>) -> Query {
        Query::new(Self::replace_parameter(name, value.as_ref(), &self.query_string))
    }

    /// Substitute parameters left to right, each on the previous result
    pub fn set_parameters<I, K, V>(&self, params: I) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let query_string = params
            .into_iter()
            .fold(self.query_string.clone(), |acc, (name, value)| {
                Self::replace_parameter(name.as_ref(), value.as_ref(), &acc)
            });
        Query::new(query_string)
    }

    /// Render every value with `transform`, then [`set_parameters`](Self::set_parameters)
    pub fn set_parameters_mapped<I, K, V, F>(&self, params: I, mut transform: F) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        F: FnMut(V) -> String,
    {
        self.set_parameters(
            params
                .into_iter()
                .map(|(name, value)| (name, transform(value))),
        )
    }

    /// Substitute a parameter with `<uri>`
    pub fn set_uri(&self, name: &str, uri: impl AsRef<str>) -> Query {
        self.set_uris([(name, uri)])
    }

    pub fn set_uris<I, K, V>(&self, params: I) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.set_parameters_mapped(params, |uri| format!("<{}>", uri.as_ref()))
    }

    /// Substitute a parameter with a plain literal
    pub fn set_literal(&self, name: &str, value: impl Into<Literal>) -> Query {
        let literal: Literal = value.into();
        self.set_literals([(name, literal)])
    }

    pub fn set_literals<I, K, V>(&self, params: I) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Literal>,
    {
        self.set_parameters_mapped(params, |value| {
            let literal: Literal = value.into();
            literal.render()
        })
    }

    /// Substitute a parameter with a literal taken from an untyped JSON value.
    ///
    /// Fails with [`QueryError::UnsupportedLiteralType`] unless the value is
    /// a string, number or boolean.
    pub fn set_json_literal(&self, name: &str, value: &serde_json::Value) -> QueryResult<Query> {
        self.set_json_literals([(name, value)])
    }

    /// All values are checked before any substitution takes place.
    pub fn set_json_literals<'a, I, K>(&self, params: I) -> QueryResult<Query>
    where
        I: IntoIterator<Item = (K, &'a serde_json::Value)>,
        K: AsRef<str>,
    {
        let literals = params
            .into_iter()
            .map(|(name, value)| Literal::try_from(value).map(|literal| (name, literal)))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(self.set_literals(literals))
    }

    /// Substitute a parameter with `'value'@tag`
    pub fn set_literal_with_language(
        &self,
        name: &str,
        value: impl fmt::Display,
        language_tag: impl AsRef<str>,
    ) -> Query {
        self.set_literals_with_language([(name, value)], language_tag)
    }

    pub fn set_literals_with_language<I, K, V>(&self, params: I, language_tag: impl AsRef<str>) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: fmt::Display,
    {
        let tag = language_tag.as_ref();
        self.set_parameters_mapped(params, |value| format!("'{}'@{}", value, tag))
    }

    /// Substitute a parameter with `'value'^^<datatype>`
    pub fn set_literal_with_datatype(
        &self,
        name: &str,
        value: impl fmt::Display,
        datatype: impl AsRef<str>,
    ) -> Query {
        self.set_literals_with_datatype([(name, value)], datatype)
    }

    pub fn set_literals_with_datatype<I, K, V>(&self, params: I, datatype: impl AsRef<str>) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: fmt::Display,
    {
        let datatype = datatype.as_ref();
        self.set_parameters_mapped(params, |value| format!("'{}'^^<{}>", value, datatype))
    }

    /// Prepend `PREFIX name: <uri>.`
    pub fn add_prefix(&self, name: &str, uri: &str) -> Query {
        self.add_prefixes([(name, uri)])
    }

    /// Prepend one `PREFIX` line per pair, in iteration order
    pub fn add_prefixes<I, K, V>(&self, prefixes: I) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let lines: Vec<String> = prefixes
            .into_iter()
            .map(|(name, uri)| format!("PREFIX {}: <{}>.", name.as_ref(), uri.as_ref()))
            .collect();

        if lines.is_empty() {
            return self.clone();
        }
        Query::new(format!("{}\n{}", lines.join("\n"), self.query_string))
    }

    /// Add `prefixes` and run the query against `endpoint_url`
    pub async fn execute(
        &self,
        endpoint_url: &str,
        prefixes: &PrefixMap,
        config: &ExecutionConfig,
    ) -> TransportResult<QueryResults> {
        let query = self.add_prefixes(prefixes);
        QueryExecution::new(query.query_string)
            .execute(endpoint_url, config)
            .await
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query_string)
    }
}

impl From<&str> for Query {
    fn from(query_string: &str) -> Self {
        Query::new(query_string)
    }
}

impl From<String> for Query {
    fn from(query_string: String) -> Self {
        Query::new(query_string)
    }
}

impl TryFrom<serde_json::Value> for Query {
    type Error = QueryError;

    fn try_from(value: serde_json::Value) -> QueryResult<Self> {
        match value {
            serde_json::Value::String(s) => Ok(Query::new(s)),
            other => Err(QueryError::InvalidArgument(json_type_name(&other).to_string())),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    const QUERY_STRING: &str = "SELECT * WHERE { ?s ?p ?o }";

    #[test]
    fn test_stores_query_string() {
        let query = Query::new("query");
        assert_eq!(query.query_string(), "query");
        assert_eq!(query.to_string(), "query");
    }

    #[test]
    fn test_try_from_json_rejects_non_strings() {
        for value in [json!(null), json!({"foo": "bar"}), json!([]), json!(1), json!(true)] {
            assert!(matches!(
                Query::try_from(value),
                Err(QueryError::InvalidArgument(_))
            ));
        }
        assert_eq!(Query::try_from(json!("ASK {}")).unwrap().query_string(), "ASK {}");
    }

    #[test]
    fn test_replace_parameter() {
        assert_eq!(Query::replace_parameter("a", "x", "?a ?b ?a"), "x ?b x");
        assert_eq!(Query::replace_parameter("c", "x", "?a ?b"), "?a ?b");
    }

    #[test]
    fn test_set_parameter() {
        let query = Query::new(QUERY_STRING).set_parameter("p", "rdf:type");
        assert_eq!(query.query_string(), "SELECT * WHERE { ?s rdf:type ?o }");
    }

    #[test]
    fn test_set_parameters_indexmap() {
        let mut params = IndexMap::new();
        params.insert("p", "rdf:type");
        params.insert("o", "dbo:Person");

        let query = Query::new(QUERY_STRING).set_parameters(&params);
        assert_eq!(query.query_string(), "SELECT * WHERE { ?s rdf:type dbo:Person }");
    }

    #[test]
    fn test_set_parameters_mapped() {
        let query = Query::new("?a ?b").set_parameters_mapped([("a", 1), ("b", 2)], |n| (n * 10).to_string());
        assert_eq!(query.query_string(), "10 20");
    }

    #[test]
    fn test_prefix_hazard_on_longer_names() {
        let query = Query::new("?s ?subject").set_parameter("s", "X");
        assert_eq!(query.query_string(), "X Xubject");
    }

    #[test]
    fn test_set_uris() {
        let query = Query::new(QUERY_STRING).set_uris([
            ("s", "http://example.com/foo"),
            ("o", "http://example.com/bar"),
        ]);
        assert_eq!(
            query.query_string(),
            "SELECT * WHERE { <http://example.com/foo> ?p <http://example.com/bar> }"
        );
    }

    #[test]
    fn test_set_literals_mixed() {
        let query = Query::new("?string ?int ?float ?boolean").set_literals([
            ("string", Literal::from("string")),
            ("int", Literal::from(42)),
            ("float", Literal::from(3.14)),
            ("boolean", Literal::from(false)),
        ]);
        assert_eq!(query.query_string(), "'string' 42 3.14 false");
    }

    #[test]
    fn test_set_json_literals_is_all_or_nothing() {
        let ok = json!("x");
        let bad = json!(null);
        let result = Query::new("?a ?b").set_json_literals([("a", &ok), ("b", &bad)]);
        assert_eq!(
            result,
            Err(QueryError::UnsupportedLiteralType("null".to_string()))
        );
    }

    #[test]
    fn test_language_and_datatype() {
        let query = Query::new("?a ?b")
            .set_literal_with_language("a", "Berlin", Language::German)
            .set_literal_with_datatype("b", 5, "http://www.w3.org/2001/XMLSchema#int");
        assert_eq!(
            query.query_string(),
            "'Berlin'@de '5'^^<http://www.w3.org/2001/XMLSchema#int>"
        );
    }

    #[test]
    fn test_add_prefixes_from_prefix_map() {
        let prefixes = PrefixMap::new()
            .with_prefix("dbo", "http://dbpedia.org/ontology/")
            .with_prefix("dbr", "http://dbpedia.org/resource/");
        let query = Query::new("ASK {}").add_prefixes(&prefixes);
        assert_eq!(
            query.query_string(),
            "PREFIX dbo: <http://dbpedia.org/ontology/>.\nPREFIX dbr: <http://dbpedia.org/resource/>.\nASK {}"
        );
    }

    #[test]
    fn test_add_no_prefixes_is_identity() {
        let query = Query::new("ASK {}").add_prefixes(&PrefixMap::new());
        assert_eq!(query.query_string(), "ASK {}");
    }

    #[test]
    fn test_receiver_unchanged() {
        let query = Query::new(QUERY_STRING);
        let _ = query.set_parameter("s", "x");
        let _ = query.set_uri("p", "http://x");
        let _ = query.set_literal("o", 1);
        let _ = query.add_prefix("x", "http://x/");
        assert_eq!(query.query_string(), QUERY_STRING);
    }
}
