//! Promise-style HTTP request helper with layered configuration.
//!
//! # Overview
//! Merges three configuration layers (built-in defaults, client
//! overrides, call arguments), issues one HTTP exchange through an
//! injected [`Transport`], and normalizes the outcome into a single
//! `Result<Response, Error>` channel.
//!
//! # Design
//! - [`Client`] is the only stateful value; it holds the override layer
//!   and nothing else. The merge itself is a pure function
//!   ([`config::effective`]), testable without a client.
//! - Transport, serializer, and deserializer are capability traits with
//!   default implementations ([`UreqTransport`], [`JsonCodec`]),
//!   swappable per client or per call.
//! - Exactly one transport lifecycle [`Event`] settles each request; the
//!   orchestrator performs no retries, redirects, or timeouts of its own.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod response;
pub mod transport;

pub use client::Client;
pub use codec::{Deserializer, JsonCodec, Serializer};
pub use config::{effective, target_url, AbortHook, Body, Config, Options, Params};
pub use error::{Error, Result};
pub use http::{Event, Method};
pub use response::{Payload, Response};
pub use transport::{
    AbortHandle, EventHandler, Listeners, Transport, TransportFactory, UreqTransport,
};
