//! XML Schema datatype IRIs used by typed SPARQL literals

/// XSD namespace
pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
pub const TIME: &str = "http://www.w3.org/2001/XMLSchema#time";
