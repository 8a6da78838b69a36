//! SPARQL protocol client
//!
//! Queries are sent as HTTP GET requests with the query text and the
//! request parameters percent-encoded into the URL. URLs longer than
//! [`MAX_URL_LENGTH`] are rejected before anything is sent.

mod endpoint;
mod execution;

pub use endpoint::{Endpoint, EndpointConfig, EndpointError, EndpointResult};
pub use execution::{
    ExecutionConfig, QueryExecution, DEFAULT_FORMAT, DEFAULT_TIMEOUT_MS, MAX_URL_LENGTH,
};

use crate::sparql::SparqlError;
use thiserror::Error;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request URL exceeds [`MAX_URL_LENGTH`]
    #[error("Url is too long ({length} characters), shorten the query")]
    QueryTooLong { length: usize },

    /// Endpoint url unusable
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response status
    #[error("Endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response could not be parsed
    #[error("Response error: {0}")]
    Parse(#[from] SparqlError),
}

pub type TransportResult<T> = Result<T, TransportError>;
