//! Literal values accepted by [`Query::set_literal`](super::Query::set_literal)

use super::{QueryError, QueryResult};
use std::fmt;

/// A plain SPARQL literal: text, number or boolean.
///
/// Text renders quoted (`'Berlin'`), numbers and booleans render bare
/// (`3.14`, `true`). Values coming from untyped sources go through
/// `TryFrom<&serde_json::Value>`, which is where anything else is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl Literal {
    /// Render the literal as it is written into the query text
    pub fn render(&self) -> String {
        match self {
            Literal::Text(text) => format!("'{}'", text),
            Literal::Number(n) => format_number(*n),
            Literal::Boolean(b) => b.to_string(),
        }
    }
}

/// Shortest round-trip form, as JavaScript prints numbers: `10`, `3.14`,
/// `-0.5`, and exponent notation outside `[1e-6, 1e21)` (`1e-7`, `1e+21`).
fn format_number(n: f64) -> String {
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        // -0 renders as 0
        return "0".to_string();
    }
    let magnitude = n.abs();
    if magnitude.is_finite() && !(1e-6..1e21).contains(&magnitude) {
        let exponential = format!("{:e}", n);
        return match exponential.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => exponential,
        };
    }
    n.to_string()
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<&String> for Literal {
    fn from(value: &String) -> Self {
        Literal::Text(value.clone())
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Literal::Number(value as f64)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Number(value as f64)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Number(value as f64)
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal::Number(value as f64)
    }
}

impl TryFrom<&serde_json::Value> for Literal {
    type Error = QueryError;

    fn try_from(value: &serde_json::Value) -> QueryResult<Self> {
        use serde_json::Value;

        match value {
            Value::String(s) => Ok(Literal::Text(s.clone())),
            Value::Number(n) => n
                .as_f64()
                .map(Literal::Number)
                .ok_or_else(|| QueryError::UnsupportedLiteralType(n.to_string())),
            Value::Bool(b) => Ok(Literal::Boolean(*b)),
            Value::Null => Err(QueryError::UnsupportedLiteralType("null".to_string())),
            Value::Array(_) => Err(QueryError::UnsupportedLiteralType("array".to_string())),
            Value::Object(_) => Err(QueryError::UnsupportedLiteralType("object".to_string())),
        }
    }
}

impl TryFrom<serde_json::Value> for Literal {
    type Error = QueryError;

    fn try_from(value: serde_json::Value) -> QueryResult<Self> {
        Literal::try_from(&value)
    }
}

/// Common language tags for [`Query::set_literal_with_language`](super::Query::set_literal_with_language)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    German,
    French,
    Spanish,
    Italian,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::German => "de",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::Italian => "it",
        }
    }
}

impl AsRef<str> for Language {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
