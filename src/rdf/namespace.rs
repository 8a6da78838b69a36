//! Namespace prefix management
//!
//! A [`PrefixMap`] is an ordered prefix → namespace IRI mapping. Insertion
//! order is preserved because it decides the order of the `PREFIX` lines
//! written in front of a query.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrefixError {
    /// Unknown prefix
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    /// Not a compact `prefix:local` IRI
    #[error("Invalid compact IRI: {0}")]
    InvalidIri(String),
}

pub type PrefixResult<T> = Result<T, PrefixError>;

/// Ordered prefix → namespace IRI mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefixMap {
    prefixes: IndexMap<String, String>,
}

impl PrefixMap {
    /// Create an empty prefix map
    pub fn new() -> Self {
        Self::default()
    }

    /// Well-known vocabularies, look them up at `prefix.cc`
    pub fn common() -> Self {
        Self::new()
            .with_prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
            .with_prefix("rdfs", "http://www.w3.org/2000/01/rdf-schema#")
            .with_prefix("xsd", "http://www.w3.org/2001/XMLSchema#")
            .with_prefix("owl", "http://www.w3.org/2002/07/owl#")
            .with_prefix("skos", "http://www.w3.org/2004/02/skos/core#")
            .with_prefix("foaf", "http://xmlns.com/foaf/0.1/")
            .with_prefix("dc", "http://purl.org/dc/elements/1.1/")
            .with_prefix("dcterms", "http://purl.org/dc/terms/")
            .with_prefix("geo", "http://www.w3.org/2003/01/geo/wgs84_pos#")
            .with_prefix("vcard", "http://www.w3.org/2006/vcard/ns#")
            .with_prefix("dbo", "http://dbpedia.org/ontology/")
            .with_prefix("dbr", "http://dbpedia.org/resource/")
            .with_prefix("dbprop", "http://dbpedia.org/property/")
    }

    /// Return a copy with `prefix` bound to `iri`.
    ///
    /// Rebinding an existing prefix keeps its original position.
    pub fn with_prefix(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), iri.into());
        self
    }

    /// Merge `other` into a copy of `self`; bindings from `other` win.
    pub fn merge(&self, other: &PrefixMap) -> PrefixMap {
        let mut merged = self.clone();
        for (prefix, iri) in &other.prefixes {
            merged.prefixes.insert(prefix.clone(), iri.clone());
        }
        merged
    }

    /// Get IRI for a prefix
    pub fn get_iri(&self, prefix: &str) -> PrefixResult<&str> {
        self.prefixes
            .get(prefix)
            .map(|s| s.as_str())
            .ok_or_else(|| PrefixError::UnknownPrefix(prefix.to_string()))
    }

    /// Expand a compact IRI (prefix:local) to full IRI
    pub fn expand(&self, compact_iri: &str) -> PrefixResult<String> {
        if let Some((prefix, local)) = compact_iri.split_once(':') {
            let iri = self.get_iri(prefix)?;
            Ok(format!("{}{}", iri, local))
        } else {
            Err(PrefixError::InvalidIri(compact_iri.to_string()))
        }
    }

    /// Compact an IRI using the longest matching namespace
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.prefixes
            .iter()
            .filter(|(_, namespace_iri)| iri.starts_with(namespace_iri.as_str()))
            .max_by_key(|(_, namespace_iri)| namespace_iri.len())
            .map(|(prefix, namespace_iri)| format!("{}:{}", prefix, &iri[namespace_iri.len()..]))
    }

    /// Keep only the prefixes that `query` actually refers to as `name:`
    pub fn used_in(&self, query: &str) -> PrefixMap {
        let prefixes = self
            .prefixes
            .iter()
            .filter(|(prefix, _)| {
                let pattern = format!(r"(^|[^\w-]){}:", regex::escape(prefix));
                Regex::new(&pattern)
                    .map(|re| re.is_match(query))
                    .unwrap_or(false)
            })
            .map(|(prefix, iri)| (prefix.clone(), iri.clone()))
            .collect();
        Self { prefixes }
    }

    /// Iterate over `(prefix, iri)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, i)| (p.as_str(), i.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PrefixMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let prefixes = iter
            .into_iter()
            .map(|(prefix, iri)| (prefix.into(), iri.into()))
            .collect();
        Self { prefixes }
    }
}

impl<'a> IntoIterator for &'a PrefixMap {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.prefixes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_prefixes() {
        let map = PrefixMap::common();

        assert_eq!(
            map.get_iri("rdf").unwrap(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#"
        );
        assert_eq!(
            map.get_iri("rdfs").unwrap(),
            "http://www.w3.org/2000/01/rdf-schema#"
        );
        assert_eq!(map.get_iri("xsd").unwrap(), "http://www.w3.org/2001/XMLSchema#");
        assert_eq!(
            map.get_iri("nope"),
            Err(PrefixError::UnknownPrefix("nope".to_string()))
        );
    }

    #[test]
    fn test_expand() {
        let map = PrefixMap::common();

        let expanded = map.expand("foaf:name").unwrap();
        assert_eq!(expanded, "http://xmlns.com/foaf/0.1/name");

        let expanded = map.expand("rdf:type").unwrap();
        assert_eq!(expanded, "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");

        assert!(matches!(map.expand("noColon"), Err(PrefixError::InvalidIri(_))));
    }

    #[test]
    fn test_compact() {
        let map = PrefixMap::common();

        let compacted = map.compact("http://xmlns.com/foaf/0.1/name");
        assert_eq!(compacted, Some("foaf:name".to_string()));

        let compacted = map.compact("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
        assert_eq!(compacted, Some("rdf:type".to_string()));

        assert_eq!(map.compact("http://example.org/x"), None);
    }

    #[test]
    fn test_compact_prefers_longest_namespace() {
        let map = PrefixMap::new()
            .with_prefix("ex", "http://example.org/")
            .with_prefix("exv", "http://example.org/vocab#");

        assert_eq!(
            map.compact("http://example.org/vocab#knows"),
            Some("exv:knows".to_string())
        );
    }

    #[test]
    fn test_merge_keeps_order_and_overrides() {
        let base = PrefixMap::new()
            .with_prefix("a", "http://a/")
            .with_prefix("b", "http://b/");
        let other = PrefixMap::new()
            .with_prefix("c", "http://c/")
            .with_prefix("a", "http://a2/");

        let merged = base.merge(&other);
        let pairs: Vec<_> = merged.iter().collect();
        assert_eq!(
            pairs,
            vec![("a", "http://a2/"), ("b", "http://b/"), ("c", "http://c/")]
        );
        // untouched
        assert_eq!(base.get_iri("a").unwrap(), "http://a/");
    }

    #[test]
    fn test_used_in() {
        let map = PrefixMap::common();
        let used = map.used_in("SELECT * WHERE { ?s rdf:type foaf:Person . ?s dbo:birthPlace ?p }");

        let names: Vec<_> = used.iter().map(|(p, _)| p).collect();
        assert_eq!(names, vec!["rdf", "foaf", "dbo"]);
    }

    #[test]
    fn test_used_in_ignores_longer_names() {
        let map = PrefixMap::new()
            .with_prefix("dc", "http://purl.org/dc/elements/1.1/")
            .with_prefix("dcterms", "http://purl.org/dc/terms/");

        let used = map.used_in("SELECT ?t WHERE { ?s dcterms:title ?t }");
        assert_eq!(used.len(), 1);
        assert!(used.get_iri("dcterms").is_ok());
    }

    #[test]
    fn test_yaml_preserves_order() {
        let map: PrefixMap = serde_yaml::from_str("zz: http://z/\naa: http://a/\n").unwrap();
        let names: Vec<_> = map.iter().map(|(p, _)| p).collect();
        assert_eq!(names, vec!["zz", "aa"]);
    }
}
