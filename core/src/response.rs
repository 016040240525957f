//! Normalized response produced on both the success and failure paths.

use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Decoded response data. Present only on success, and only when the
/// response carried a non-empty body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured data produced by the configured deserializer.
    Json(serde_json::Value),
    /// Raw-mode passthrough of the response text.
    Text(String),
}

/// Outcome of one exchange: status code, raw payload as provided by the
/// transport, decoded data, and the transport itself for advanced
/// inspection. Failure paths build the same shape with `data` absent.
pub struct Response {
    pub status: u16,
    pub body: Option<String>,
    pub data: Option<Payload>,
    transport: Box<dyn Transport>,
}

impl Response {
    pub(crate) fn from_transport(transport: Box<dyn Transport>, data: Option<Payload>) -> Self {
        let status = transport.status();
        let body = transport.response_text().map(str::to_string);
        Self {
            status,
            body,
            data,
            transport,
        }
    }

    /// The transport that performed (or abandoned) the exchange.
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the raw body into a concrete type, independent of the
    /// configured deserializer.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body = self.body.as_deref().unwrap_or_default();
        serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("body", &self.body)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
