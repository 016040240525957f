//! The transport capability and its default ureq-backed implementation.
//!
//! # Design
//! A transport represents exactly one HTTP request/response exchange:
//! created by the configured factory, driven through `open`, credentials,
//! headers, and a single `send` that blocks until one lifecycle [`Event`]
//! occurs, then discarded with the outcome that embeds it. Implementations
//! may emit additional named events through the [`Listeners`] dispatcher
//! while sending.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::http::{Event, Method};

/// Extra event callback. Receives the transport that emitted the event.
pub type EventHandler = Arc<dyn Fn(&dyn Transport) + Send + Sync>;

/// Factory producing a fresh transport for each request.
pub type TransportFactory = Arc<dyn Fn() -> Box<dyn Transport> + Send + Sync>;

/// Cancellation flag handed to an abort hook.
///
/// Cloning shares the flag. `abort` marks the request as cancelled; the
/// orchestrator and the transport act on it at their next checkpoint.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Dispatches named extra events to caller-configured handlers.
///
/// Lifecycle event names (`load`, `abort`, `error`, `timeout`) are
/// dispatched by the orchestrator after `send` settles; anything else is
/// up to the transport.
pub struct Listeners {
    handlers: BTreeMap<String, EventHandler>,
}

impl Listeners {
    pub fn new(handlers: BTreeMap<String, EventHandler>) -> Self {
        Self { handlers }
    }

    /// Invoke the handler registered under `name`, if any, with the
    /// transport as its argument.
    pub fn emit(&self, name: &str, transport: &dyn Transport) {
        if let Some(handler) = self.handlers.get(name) {
            handler(transport);
        }
    }
}

/// One HTTP request/response exchange.
///
/// Call order: `open`, then `set_with_credentials` (the flag is only
/// writable after open), then headers, then one `send`. The inspection
/// methods report whatever the transport has observed so far; after an
/// abort, error, or timeout the status is commonly 0.
pub trait Transport {
    /// Prepare the exchange for `method` against `url`.
    fn open(&mut self, method: Method, url: &str);

    /// Set the credentials flag. Called after `open`.
    fn set_with_credentials(&mut self, enabled: bool);

    fn with_credentials(&self) -> bool;

    /// Apply one request header.
    fn set_header(&mut self, name: &str, value: &str);

    /// Share the request's cancellation flag with the transport.
    fn register_abort(&mut self, handle: AbortHandle);

    /// Perform the exchange, blocking until one lifecycle event occurs.
    fn send(&mut self, body: Option<String>, listeners: &Listeners) -> Event;

    /// Abandon the exchange. A subsequent `send` reports `Event::Abort`.
    fn abort(&mut self);

    fn status(&self) -> u16;

    fn response_text(&self) -> Option<&str>;

    fn response_header(&self, name: &str) -> Option<&str>;
}

/// Default transport: a blocking ureq agent.
///
/// Status codes are reported as data (`http_status_as_error` disabled) so
/// the orchestrator owns status interpretation. Emits `loadstart` before
/// the exchange and `loadend` after a completed response. The credentials
/// flag is recorded and readable back; a server-side client has no
/// cookie-credential distinction to enforce with it.
#[derive(Debug, Default)]
pub struct UreqTransport {
    method: Option<Method>,
    url: String,
    headers: Vec<(String, String)>,
    credentials: bool,
    timeout: Option<Duration>,
    abort: AbortHandle,
    aborted: bool,
    status: u16,
    body: Option<String>,
    response_headers: Vec<(String, String)>,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overall deadline for the exchange, reported as a timed-out event.
    /// This is the only timeout the orchestrator knows about.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }
}

impl Transport for UreqTransport {
    fn open(&mut self, method: Method, url: &str) {
        self.method = Some(method);
        self.url = url.to_string();
    }

    fn set_with_credentials(&mut self, enabled: bool) {
        self.credentials = enabled;
    }

    fn with_credentials(&self) -> bool {
        self.credentials
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn register_abort(&mut self, handle: AbortHandle) {
        self.abort = handle;
    }

    fn send(&mut self, body: Option<String>, listeners: &Listeners) -> Event {
        if self.aborted || self.abort.is_aborted() {
            self.aborted = true;
            return Event::Abort;
        }
        let Some(method) = self.method else {
            // send without open
            return Event::Error;
        };

        listeners.emit("loadstart", &*self);

        let mut config = ureq::Agent::config_builder().http_status_as_error(false);
        if let Some(timeout) = self.timeout {
            config = config.timeout_global(Some(timeout));
        }
        let agent = config.build().new_agent();

        let mut builder = ureq::http::Request::builder()
            .method(method.as_str())
            .uri(self.url.as_str());
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let request = match builder.body(body.as_deref().unwrap_or_default()) {
            Ok(request) => request,
            Err(err) => {
                log::debug!("building request for {} failed: {err}", self.url);
                return Event::Error;
            }
        };

        match agent.run(request) {
            Ok(mut response) => {
                self.status = response.status().as_u16();
                self.response_headers = response
                    .headers()
                    .iter()
                    .map(|(name, value)| {
                        (
                            name.as_str().to_string(),
                            value.to_str().unwrap_or_default().to_string(),
                        )
                    })
                    .collect();
                self.body = Some(response.body_mut().read_to_string().unwrap_or_default());
                listeners.emit("loadend", &*self);
                Event::Load
            }
            Err(ureq::Error::Timeout(_)) => {
                log::debug!("request to {} timed out", self.url);
                Event::Timeout
            }
            Err(err) => {
                log::debug!("transport error for {}: {err}", self.url);
                Event::Error
            }
        }
    }

    fn abort(&mut self) {
        self.aborted = true;
    }

    fn status(&self) -> u16 {
        self.status
    }

    fn response_text(&self) -> Option<&str> {
        self.body.as_deref()
    }

    fn response_header(&self, name: &str) -> Option<&str> {
        self.response_headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
