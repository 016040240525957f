//! Configuration layers and the pure merge.
//!
//! # Design
//! Three layers exist per call: built-in defaults (`Config::default`),
//! client-level overrides, and call arguments (both `Options`). The merge
//! is shallow and per-key: a later layer that sets `headers` replaces the
//! whole map, it does not splice into it. [`effective`] is a pure function
//! of the three layers so precedence is testable without a client or any
//! global state.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::codec::{Deserializer, JsonCodec, Serializer};
use crate::error::{Error, Result};
use crate::http::Method;
use crate::transport::{AbortHandle, EventHandler, Transport, TransportFactory, UreqTransport};

/// Request body: structured JSON or raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Structured(Value),
    Text(String),
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Structured(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

/// Query parameters, encoded in declaration order.
pub type Params = Vec<(String, String)>;

/// Hook invoked with the request's abort handle before the transport
/// sends anything.
pub type AbortHook = Box<dyn FnOnce(AbortHandle) + Send>;

/// A partial configuration layer. Unset fields defer to earlier layers.
#[derive(Default)]
pub struct Options {
    pub method: Option<Method>,
    pub url: Option<String>,
    pub body: Option<Body>,
    pub params: Option<Params>,
    pub headers: Option<BTreeMap<String, String>>,
    pub dump: Option<Arc<dyn Serializer>>,
    pub load: Option<Arc<dyn Deserializer>>,
    pub transport: Option<TransportFactory>,
    pub with_credentials: Option<bool>,
    pub raw: Option<bool>,
    pub events: Option<BTreeMap<String, EventHandler>>,
    /// Consulted from call arguments only; [`effective`] ignores it, so a
    /// hook placed in client-level overrides never fires.
    pub abort: Option<AbortHook>,
}

impl Options {
    /// Shallow per-key merge: every field set in `other` replaces the
    /// corresponding field here. Merging empty options changes nothing.
    pub fn merge(&mut self, other: Options) {
        let Options {
            method,
            url,
            body,
            params,
            headers,
            dump,
            load,
            transport,
            with_credentials,
            raw,
            events,
            abort,
        } = other;
        if method.is_some() {
            self.method = method;
        }
        if url.is_some() {
            self.url = url;
        }
        if body.is_some() {
            self.body = body;
        }
        if params.is_some() {
            self.params = params;
        }
        if headers.is_some() {
            self.headers = headers;
        }
        if dump.is_some() {
            self.dump = dump;
        }
        if load.is_some() {
            self.load = load;
        }
        if transport.is_some() {
            self.transport = transport;
        }
        if with_credentials.is_some() {
            self.with_credentials = with_credentials;
        }
        if raw.is_some() {
            self.raw = raw;
        }
        if events.is_some() {
            self.events = events;
        }
        if abort.is_some() {
            self.abort = abort;
        }
    }
}

/// The effective configuration for one request.
#[derive(Clone)]
pub struct Config {
    pub method: Method,
    pub url: Option<String>,
    pub body: Option<Body>,
    pub params: Option<Params>,
    pub headers: BTreeMap<String, String>,
    pub dump: Arc<dyn Serializer>,
    pub load: Arc<dyn Deserializer>,
    pub transport: TransportFactory,
    pub with_credentials: bool,
    pub raw: bool,
    pub events: BTreeMap<String, EventHandler>,
}

impl Default for Config {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            method: Method::Get,
            url: None,
            body: None,
            params: None,
            headers,
            dump: Arc::new(JsonCodec),
            load: Arc::new(JsonCodec),
            transport: Arc::new(|| Box::new(UreqTransport::new()) as Box<dyn Transport>),
            with_credentials: false,
            raw: false,
            events: BTreeMap::new(),
        }
    }
}

/// Compute the effective configuration: defaults, then overrides, then
/// call arguments; later layers win per key.
pub fn effective(defaults: &Config, overrides: &Options, args: &Options) -> Config {
    let mut config = defaults.clone();
    for layer in [overrides, args] {
        if let Some(method) = layer.method {
            config.method = method;
        }
        if let Some(url) = &layer.url {
            config.url = Some(url.clone());
        }
        if let Some(body) = &layer.body {
            config.body = Some(body.clone());
        }
        if let Some(params) = &layer.params {
            config.params = Some(params.clone());
        }
        if let Some(headers) = &layer.headers {
            config.headers = headers.clone();
        }
        if let Some(dump) = &layer.dump {
            config.dump = Arc::clone(dump);
        }
        if let Some(load) = &layer.load {
            config.load = Arc::clone(load);
        }
        if let Some(transport) = &layer.transport {
            config.transport = Arc::clone(transport);
        }
        if let Some(with_credentials) = layer.with_credentials {
            config.with_credentials = with_credentials;
        }
        if let Some(raw) = layer.raw {
            config.raw = raw;
        }
        if let Some(events) = &layer.events {
            config.events = events.clone();
        }
    }
    config
}

/// Build the final request URL. When `params` is present, only the
/// portion of `url` before its first `?` is kept and the encoded
/// parameters are appended, discarding any embedded query string.
pub fn target_url(url: &str, params: Option<&Params>) -> Result<String> {
    match params {
        Some(params) => {
            let path = url.split('?').next().unwrap_or(url);
            let query =
                serde_urlencoded::to_string(params).map_err(|e| Error::Encode(e.to_string()))?;
            Ok(format!("{path}?{query}"))
        }
        None => Ok(url.to_string()),
    }
}
