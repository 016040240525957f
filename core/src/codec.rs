//! Body serialization seams.
//!
//! The orchestrator never calls `serde_json` directly for request or
//! response bodies; it goes through these traits so a caller can swap the
//! wire format wholesale via configuration. `JsonCodec` is the default on
//! both sides.

use serde_json::Value;

use crate::error::{Error, Result};

/// Encodes a structured request body into its wire form.
pub trait Serializer: Send + Sync {
    fn dump(&self, value: &Value) -> Result<String>;
}

/// Decodes a response body into a structured value.
pub trait Deserializer: Send + Sync {
    fn load(&self, text: &str) -> Result<Value>;
}

/// Default codec: compact JSON on both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Serializer for JsonCodec {
    fn dump(&self, value: &Value) -> Result<String> {
        serde_json::to_string(value).map_err(|e| Error::Encode(e.to_string()))
    }
}

impl Deserializer for JsonCodec {
    fn load(&self, text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(|e| Error::Decode(e.to_string()))
    }
}
