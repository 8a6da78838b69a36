//! Normalized SPARQL query results

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Placeholder for a missing language tag or datatype
pub const UNKNOWN: &str = "unknown";

/// Datatype reported for IRI solutions
pub const URI_DATATYPE: &str = "uri";

/// A solution value after datatype coercion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SolutionValue {
    /// Raw lexical form (no transform registered, or coercion failed)
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl SolutionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SolutionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SolutionValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value, integers widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SolutionValue::Integer(i) => Some(*i as f64),
            SolutionValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SolutionValue::Date(d) => Some(*d),
            SolutionValue::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            SolutionValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for SolutionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionValue::Text(s) => write!(f, "{}", s),
            SolutionValue::Integer(i) => write!(f, "{}", i),
            SolutionValue::Decimal(d) => write!(f, "{}", d),
            SolutionValue::Date(d) => write!(f, "{}", d),
            SolutionValue::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

impl From<&str> for SolutionValue {
    fn from(s: &str) -> Self {
        SolutionValue::Text(s.to_string())
    }
}

impl From<String> for SolutionValue {
    fn from(s: String) -> Self {
        SolutionValue::Text(s)
    }
}

/// One variable of one result row: `{ value, language, datatype }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSolution {
    pub value: SolutionValue,
    /// `xml:lang` tag, or [`UNKNOWN`]
    pub language: String,
    /// Datatype IRI, [`URI_DATATYPE`] for IRIs, or [`UNKNOWN`]
    pub datatype: String,
}

impl ResolvedSolution {
    pub fn new(
        value: impl Into<SolutionValue>,
        language: impl Into<String>,
        datatype: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            language: language.into(),
            datatype: datatype.into(),
        }
    }

    pub fn is_uri(&self) -> bool {
        self.datatype == URI_DATATYPE
    }
}

/// A result row: variable name → solution, in response order.
///
/// Variables bound to unsupported terms (blank nodes) are absent.
pub type FlatBinding = IndexMap<String, ResolvedSolution>;

/// Result of an ASK query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResults {
    /// `head.link` as sent by the endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub further_info: Option<Vec<String>>,
    pub results: bool,
}

/// Result of a SELECT query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectResults {
    /// `head.link` as sent by the endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub further_info: Option<Vec<String>>,
    /// `head.vars` as sent by the endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    pub results: Vec<FlatBinding>,
}

impl SelectResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Column names: `head.vars`, or the keys seen across all rows
    pub fn columns(&self) -> Vec<String> {
        if let Some(vars) = &self.variables {
            return vars.clone();
        }
        let mut columns: Vec<String> = Vec::new();
        for row in &self.results {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// Rows reduced to their values, dropping language and datatype
    pub fn values(&self) -> Vec<IndexMap<String, SolutionValue>> {
        self.results
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(variable, solution)| (variable.clone(), solution.value.clone()))
                    .collect()
            })
            .collect()
    }
}

/// Normalized SPARQL/JSON response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResults {
    Ask(AskResults),
    Select(SelectResults),
}

impl QueryResults {
    pub fn is_ask(&self) -> bool {
        matches!(self, QueryResults::Ask(_))
    }

    pub fn as_ask(&self) -> Option<&AskResults> {
        match self {
            QueryResults::Ask(ask) => Some(ask),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<&SelectResults> {
        match self {
            QueryResults::Select(select) => Some(select),
            _ => None,
        }
    }

    pub fn further_info(&self) -> Option<&[String]> {
        match self {
            QueryResults::Ask(ask) => ask.further_info.as_deref(),
            QueryResults::Select(select) => select.further_info.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_accessors() {
        assert_eq!(SolutionValue::Integer(12).as_f64(), Some(12.0));
        assert_eq!(SolutionValue::Decimal(3.5).as_i64(), None);
        assert_eq!(SolutionValue::from("abc").as_str(), Some("abc"));

        let dt = NaiveDate::from_ymd_opt(2009, 2, 15)
            .unwrap()
            .and_hms_opt(15, 16, 17)
            .unwrap();
        assert_eq!(
            SolutionValue::DateTime(dt).as_date(),
            NaiveDate::from_ymd_opt(2009, 2, 15)
        );
    }

    #[test]
    fn test_serialize_select() {
        let mut row = FlatBinding::new();
        row.insert(
            "age".to_string(),
            ResolvedSolution::new(SolutionValue::Integer(30), UNKNOWN, "http://www.w3.org/2001/XMLSchema#integer"),
        );
        let results = QueryResults::Select(SelectResults {
            further_info: None,
            variables: Some(vec!["age".to_string()]),
            results: vec![row],
        });

        assert_eq!(
            serde_json::to_value(&results).unwrap(),
            json!({
                "variables": ["age"],
                "results": [
                    {"age": {"value": 30, "language": "unknown", "datatype": "http://www.w3.org/2001/XMLSchema#integer"}}
                ]
            })
        );
    }

    #[test]
    fn test_serialize_ask() {
        let results = QueryResults::Ask(AskResults {
            further_info: Some(vec!["info".to_string()]),
            results: true,
        });
        assert_eq!(
            serde_json::to_value(&results).unwrap(),
            json!({"furtherInfo": ["info"], "results": true})
        );
    }

    #[test]
    fn test_columns_fall_back_to_row_keys() {
        let mut first = FlatBinding::new();
        first.insert("a".into(), ResolvedSolution::new("1", UNKNOWN, UNKNOWN));
        let mut second = FlatBinding::new();
        second.insert("b".into(), ResolvedSolution::new("2", UNKNOWN, UNKNOWN));
        second.insert("a".into(), ResolvedSolution::new("3", UNKNOWN, UNKNOWN));

        let select = SelectResults {
            further_info: None,
            variables: None,
            results: vec![first, second],
        };
        assert_eq!(select.columns(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_values_keep_only_solution_values() {
        let mut row = FlatBinding::new();
        row.insert("name".into(), ResolvedSolution::new("Bob", "en", UNKNOWN));
        row.insert(
            "age".into(),
            ResolvedSolution::new(SolutionValue::Integer(7), UNKNOWN, "http://www.w3.org/2001/XMLSchema#integer"),
        );
        let select = SelectResults {
            further_info: None,
            variables: None,
            results: vec![row, FlatBinding::new()],
        };

        let values = select.values();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["name"], SolutionValue::from("Bob"));
        assert_eq!(values[0]["age"], SolutionValue::Integer(7));
        assert!(values[1].is_empty());
    }
}
