//! SPARQL 1.1 Query Results JSON parsing
//!
//! [`JsonParser`] decodes a response body once, decides whether it is an
//! ASK or a SELECT response and hands the decoded payload to the matching
//! parser. A payload is an ASK response iff it has a top-level `boolean`
//! key.

use super::results::{
    AskResults, FlatBinding, QueryResults, ResolvedSolution, SelectResults, UNKNOWN, URI_DATATYPE,
};
use super::transform::{default_registry, TypeTransformRegistry};
use super::{SparqlError, SparqlResult};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// `head` section of a response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Head {
    pub link: Option<Vec<String>>,
    pub vars: Option<Vec<String>>,
}

/// RDF term kind of a binding value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    Uri,
    Literal,
    /// `bnode`, `triple`, a missing `type` and anything else
    #[default]
    #[serde(other)]
    Unsupported,
}

/// A bound RDF term as sent on the wire.
///
/// `value` is kept as raw JSON: quoted triples carry an object there, and
/// such terms must still decode so they can be dropped from their row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Term {
    #[serde(rename = "type", default)]
    pub kind: TermKind,
    #[serde(default)]
    pub value: Value,
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang")]
    pub language: Option<String>,
}

impl Term {
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Uri,
            value: Value::String(value.into()),
            datatype: None,
            language: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: Value::String(value.into()),
            datatype: None,
            language: None,
        }
    }

    /// Lexical form; empty when `value` is missing or not a string
    pub fn lexical(&self) -> &str {
        self.value.as_str().unwrap_or_default()
    }

    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// One row of a SELECT response: variable name → term
pub type Binding = IndexMap<String, Term>;

#[derive(Debug, Deserialize)]
struct AskResponse {
    head: Head,
    boolean: bool,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    head: Head,
    results: SelectBody,
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    bindings: Vec<Binding>,
}

/// Parser for ASK responses
#[derive(Debug, Clone)]
pub struct AskParser {
    data: Arc<Value>,
}

impl AskParser {
    pub fn new(data: Arc<Value>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Arc<Value> {
        &self.data
    }

    /// `{ further_info: head.link, results: boolean }`
    pub fn parse(&self) -> SparqlResult<AskResults> {
        let response = AskResponse::deserialize(self.data.as_ref())
            .map_err(|source| SparqlError::AttributeAccess { kind: "ASK", source })?;

        Ok(AskResults {
            further_info: response.head.link,
            results: response.boolean,
        })
    }
}

/// Parser for SELECT responses
#[derive(Debug, Clone)]
pub struct SelectParser {
    data: Arc<Value>,
    registry: Arc<TypeTransformRegistry>,
}

impl SelectParser {
    pub fn new(data: Arc<Value>, registry: Arc<TypeTransformRegistry>) -> Self {
        Self { data, registry }
    }

    pub fn data(&self) -> &Arc<Value> {
        &self.data
    }

    /// `{ further_info: head.link, variables: head.vars, results: flattened bindings }`
    pub fn parse(&self) -> SparqlResult<SelectResults> {
        let response = SelectResponse::deserialize(self.data.as_ref())
            .map_err(|source| SparqlError::AttributeAccess { kind: "SELECT", source })?;

        Ok(SelectResults {
            further_info: response.head.link,
            variables: response.head.vars,
            results: self.flatten_bindings(&response.results.bindings),
        })
    }

    pub fn resolve_uri_solution(&self, term: &Term) -> ResolvedSolution {
        ResolvedSolution::new(term.lexical(), UNKNOWN, URI_DATATYPE)
    }

    /// Apply the registered transform for the literal's datatype, if any
    pub fn resolve_literal_solution(&self, term: &Term) -> ResolvedSolution {
        let lexical = term.lexical();
        let value = term
            .datatype
            .as_deref()
            .and_then(|datatype| self.registry.apply(datatype, lexical))
            .unwrap_or_else(|| lexical.into());

        ResolvedSolution {
            value,
            language: term.language.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            datatype: term.datatype.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    /// `None` for blank nodes, quoted triples and other unsupported terms.
    ///
    /// A uri or literal whose `value` is present but not a string is
    /// unsupported as well.
    pub fn resolve_query_solution(&self, term: &Term) -> Option<ResolvedSolution> {
        if !(term.value.is_string() || term.value.is_null()) {
            debug!("Dropping {:?} term with non-string value", term.kind);
            return None;
        }
        match term.kind {
            TermKind::Uri => Some(self.resolve_uri_solution(term)),
            TermKind::Literal => Some(self.resolve_literal_solution(term)),
            TermKind::Unsupported => None,
        }
    }

    /// Resolve every variable of a row, dropping unsupported terms
    pub fn flatten_binding(&self, binding: &Binding) -> FlatBinding {
        binding
            .iter()
            .filter_map(|(variable, term)| {
                self.resolve_query_solution(term)
                    .map(|solution| (variable.clone(), solution))
            })
            .collect()
    }

    pub fn flatten_bindings(&self, bindings: &[Binding]) -> Vec<FlatBinding> {
        bindings.iter().map(|binding| self.flatten_binding(binding)).collect()
    }
}

/// The parser a response was routed to
#[derive(Debug, Clone)]
pub enum ResponseParser {
    Ask(AskParser),
    Select(SelectParser),
}

impl ResponseParser {
    pub fn parse(&self) -> SparqlResult<QueryResults> {
        match self {
            ResponseParser::Ask(parser) => parser.parse().map(QueryResults::Ask),
            ResponseParser::Select(parser) => parser.parse().map(QueryResults::Select),
        }
    }
}

/// Decodes a SPARQL/JSON body and delegates to the ASK or SELECT parser
#[derive(Debug, Clone)]
pub struct JsonParser {
    data: Arc<Value>,
    response_parser: ResponseParser,
}

impl JsonParser {
    /// Decode `body` using the built-in type transforms
    pub fn new(body: &str) -> SparqlResult<Self> {
        Self::with_registry(body, default_registry())
    }

    /// Decode `body` using a caller-supplied transform registry
    pub fn with_registry(body: &str, registry: Arc<TypeTransformRegistry>) -> SparqlResult<Self> {
        let data: Value = serde_json::from_str(body).map_err(SparqlError::MalformedResponse)?;
        Ok(Self::from_value(data, registry))
    }

    /// Route an already decoded payload
    pub fn from_value(data: Value, registry: Arc<TypeTransformRegistry>) -> Self {
        let data = Arc::new(data);
        let response_parser = if Self::is_ask_response(&data) {
            debug!("Routing response to ASK parser");
            ResponseParser::Ask(AskParser::new(Arc::clone(&data)))
        } else {
            debug!("Routing response to SELECT parser");
            ResponseParser::Select(SelectParser::new(Arc::clone(&data), registry))
        };

        Self {
            data,
            response_parser,
        }
    }

    /// ASK iff the payload has a `boolean` key
    pub fn is_ask_response(data: &Value) -> bool {
        data.get("boolean").is_some()
    }

    /// The decoded payload
    pub fn data(&self) -> &Arc<Value> {
        &self.data
    }

    pub fn response_parser(&self) -> &ResponseParser {
        &self.response_parser
    }

    pub fn parse(&self) -> SparqlResult<QueryResults> {
        self.response_parser.parse()
    }
}
