//! Error types for the request helper.
//!
//! # Design
//! One failure channel for everything: configuration mistakes, non-2xx
//! statuses, transport lifecycle failures, and codec errors all arrive as
//! `Error`. Status and transport failures carry the normalized `Response`
//! (with no decoded data) so callers can still inspect what came back.

use crate::http::Event;
use crate::response::Response;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by `Client::request` and the verb wrappers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The effective configuration has no URL. A programming error, not a
    /// network failure.
    #[error("no URL defined")]
    NoUrl,

    /// The server answered with a status outside [200, 300).
    #[error("HTTP {}", .0.status)]
    Status(Response),

    /// The transport ended the exchange without a completed response:
    /// abort, network error, or timeout. The status reflects whatever the
    /// transport reports, commonly 0.
    #[error("transport {event} (status {})", .response.status)]
    Transport { event: Event, response: Response },

    /// The request body or query parameters could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl Error {
    /// The normalized response carried by status and transport failures.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Status(response) | Error::Transport { response, .. } => Some(response),
            _ => None,
        }
    }
}
