//! Datatype-driven coercion of literal values
//!
//! The registry maps a datatype IRI to a function turning the lexical
//! form of a literal into a [`SolutionValue`]. Literals with an
//! unregistered datatype keep their raw text.

use super::results::SolutionValue;
use crate::rdf::xsd;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Coercion function for one datatype
pub type TypeTransform = Arc<dyn Fn(&str) -> SolutionValue + Send + Sync>;

/// Datatype IRI → coercion function
#[derive(Clone)]
pub struct TypeTransformRegistry {
    transforms: HashMap<String, TypeTransform>,
}

impl TypeTransformRegistry {
    /// Registry without any transforms
    pub fn empty() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Registry with the XSD integer, decimal, string, date, dateTime and time transforms
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(xsd::INTEGER, parse_integer);
        registry.register(xsd::DECIMAL, parse_decimal);
        registry.register(xsd::STRING, identity);
        registry.register(xsd::DATE, parse_temporal);
        registry.register(xsd::DATE_TIME, parse_temporal);
        registry.register(xsd::TIME, identity);
        registry
    }

    /// Register (or replace) the transform for `datatype`
    pub fn register<F>(&mut self, datatype: impl Into<String>, transform: F)
    where
        F: Fn(&str) -> SolutionValue + Send + Sync + 'static,
    {
        self.transforms.insert(datatype.into(), Arc::new(transform));
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_transform<F>(mut self, datatype: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&str) -> SolutionValue + Send + Sync + 'static,
    {
        self.register(datatype, transform);
        self
    }

    pub fn get(&self, datatype: &str) -> Option<&TypeTransform> {
        self.transforms.get(datatype)
    }

    pub fn contains(&self, datatype: &str) -> bool {
        self.transforms.contains_key(datatype)
    }

    /// Coerce `lexical` if a transform is registered for `datatype`
    pub fn apply(&self, datatype: &str, lexical: &str) -> Option<SolutionValue> {
        self.transforms.get(datatype).map(|transform| transform(lexical))
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for TypeTransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeTransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut datatypes: Vec<&String> = self.transforms.keys().collect();
        datatypes.sort();
        f.debug_struct("TypeTransformRegistry")
            .field("datatypes", &datatypes)
            .finish()
    }
}

/// Shared registry holding the built-in transforms
pub fn default_registry() -> Arc<TypeTransformRegistry> {
    static DEFAULT: OnceLock<Arc<TypeTransformRegistry>> = OnceLock::new();
    DEFAULT
        .get_or_init(|| Arc::new(TypeTransformRegistry::new()))
        .clone()
}

pub fn identity(lexical: &str) -> SolutionValue {
    SolutionValue::Text(lexical.to_string())
}

fn integer_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+").expect("valid integer regex"))
}

fn hex_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([+-]?)0[xX]([0-9a-fA-F]*)").expect("valid hex regex"))
}

fn decimal_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("valid decimal regex")
    })
}

/// Leading-prefix integer parse: `"12"` → 12, `"12abc"` → 12, `"3.5"` → 3.
///
/// A `0x` prefix reads hexadecimal (`"0x1A"` → 26). Values beyond `i64`
/// become decimals; text without leading digits stays text.
pub fn parse_integer(lexical: &str) -> SolutionValue {
    let trimmed = lexical.trim_start();
    if let Some(caps) = hex_prefix().captures(trimmed) {
        return parse_hex(&caps[1] == "-", &caps[2], lexical);
    }

    let Some(m) = integer_prefix().find(trimmed) else {
        debug!("Integer literal without numeric prefix: {:?}", lexical);
        return identity(lexical);
    };
    match m.as_str().parse::<i64>() {
        Ok(i) => SolutionValue::Integer(i),
        Err(_) => m
            .as_str()
            .parse::<f64>()
            .map(SolutionValue::Decimal)
            .unwrap_or_else(|_| identity(lexical)),
    }
}

fn parse_hex(negative: bool, digits: &str, lexical: &str) -> SolutionValue {
    if digits.is_empty() {
        debug!("Hex literal without digits: {:?}", lexical);
        return identity(lexical);
    }
    match i64::from_str_radix(digits, 16) {
        Ok(i) => SolutionValue::Integer(if negative { -i } else { i }),
        Err(_) => {
            let magnitude = digits
                .chars()
                .filter_map(|c| c.to_digit(16))
                .fold(0.0, |acc, d| acc * 16.0 + f64::from(d));
            SolutionValue::Decimal(if negative { -magnitude } else { magnitude })
        }
    }
}

/// Leading-prefix float parse: `"3.5"` → 3.5, `"1e3x"` → 1000.0
pub fn parse_decimal(lexical: &str) -> SolutionValue {
    let Some(m) = decimal_prefix().find(lexical.trim_start()) else {
        debug!("Decimal literal without numeric prefix: {:?}", lexical);
        return identity(lexical);
    };
    match m.as_str().parse::<f64>() {
        Ok(d) => SolutionValue::Decimal(d),
        Err(_) => identity(lexical),
    }
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const ZONED_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Date or date-time parse for `xsd:date` and `xsd:dateTime`.
///
/// Zoned values are normalized to UTC. A date with a zone suffix
/// (`2020-01-01Z`, `2020-01-01+02:00`) keeps its calendar date.
pub fn parse_temporal(lexical: &str) -> SolutionValue {
    let s = lexical.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return SolutionValue::DateTime(dt.naive_utc());
    }
    for format in ZONED_DATE_TIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return SolutionValue::DateTime(dt.naive_utc());
        }
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return SolutionValue::DateTime(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return SolutionValue::Date(date);
    }
    if let Some(date) = zoned_date(s) {
        return SolutionValue::Date(date);
    }

    debug!("Unparseable date literal: {:?}", lexical);
    identity(lexical)
}

fn zoned_date(s: &str) -> Option<NaiveDate> {
    if s.len() <= 10 || !s.is_char_boundary(10) {
        return None;
    }
    let (date, zone) = s.split_at(10);
    let zone_ok = zone == "Z" || (zone.len() == 6 && (zone.starts_with('+') || zone.starts_with('-')));
    if !zone_ok {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}
