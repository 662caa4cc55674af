//! Transport abstraction for delivering a [`SearchRequest`].
//!
//! Implementations report which of three things happened: the server
//! responded (with any status), the request went out but nothing came back,
//! or the request never left. [`classify`] turns that into a
//! [`SearchOutcome`]; no library error shape leaks past this boundary.

use async_trait::async_trait;
use thiserror::Error;

use crate::response::{ErrorBody, SearchOutcome, SearchResponse};
use crate::{SearchError, SearchRequest};

/// Raw HTTP response, any status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

impl TransportResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure without a server response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request was dispatched but no response arrived in time.
    #[error("no response: {0}")]
    NoResponse(String),

    /// The request could not be built or dispatched.
    #[error("not sent: {0}")]
    NotSent(String),
}

/// Sends search requests to the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers the request and returns the server's response, whatever its status.
    async fn send(&self, request: &SearchRequest) -> Result<TransportResponse, TransportError>;
}

/// Maps a transport result to a displayable outcome.
///
/// Priority: a server response (2xx or not) first, then "sent but no
/// response", then "never sent". A 2xx body that is not a valid answer is
/// reported as a client-side failure.
pub fn classify(result: Result<TransportResponse, TransportError>) -> SearchOutcome {
    match result {
        Ok(response) if response.is_success() => {
            match serde_json::from_str::<SearchResponse>(&response.body) {
                Ok(parsed) => SearchOutcome::from(parsed),
                Err(e) => SearchOutcome::failure(&SearchError::Client(format!(
                    "invalid response body: {}",
                    e
                ))),
            }
        }
        Ok(response) => SearchOutcome::failure(&SearchError::Server {
            status: response.status,
            detail: ErrorBody::parse(&response.body).message(),
        }),
        Err(TransportError::NoResponse(cause)) => {
            SearchOutcome::failure(&SearchError::Network(cause))
        }
        Err(TransportError::NotSent(cause)) => SearchOutcome::failure(&SearchError::Client(cause)),
    }
}
