//! RDF vocabulary helpers
//!
//! Namespace prefixes written in front of queries and the XSD datatype
//! IRIs that drive literal coercion in result parsing.

mod namespace;
pub mod xsd;

pub use namespace::{PrefixError, PrefixMap, PrefixResult};
