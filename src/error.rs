//! Error types for the search client.
//!
//! The first four variants are the user-facing failure kinds of a search
//! submission. Their `Display` output is the exact message shown to the user.

use thiserror::Error;

/// Result type alias for search client operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Message shown when the query is blank.
pub const EMPTY_QUERY_MESSAGE: &str = "Please enter your question";

/// Message shown when a request was dispatched but nothing came back.
pub const NO_RESPONSE_MESSAGE: &str = "Cannot connect to server. Check network or backend status.";

/// Errors that can occur while composing, sending or persisting a search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The query was empty after trimming. Never reaches the network.
    #[error("{}", EMPTY_QUERY_MESSAGE)]
    Validation,

    /// The server answered with a non-2xx status.
    #[error("Error ({status}): {detail}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// `detail`, else `error`, else "Server error".
        detail: String,
    },

    /// The request was dispatched but no response arrived (connectivity or timeout).
    #[error("{}", NO_RESPONSE_MESSAGE)]
    Network(String),

    /// The request could not be built or sent at all.
    #[error("Request failed: {0}")]
    Client(String),

    /// Durable storage could not be read or written.
    #[error("Storage I/O error: {0}")]
    Storage(#[from] std::io::Error),

    /// Durable storage contents could not be encoded or decoded.
    #[error("Storage encoding error: {0}")]
    StorageFormat(#[from] serde_json::Error),

    /// Endpoint URL is malformed.
    #[error("Invalid endpoint URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
