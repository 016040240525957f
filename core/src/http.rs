//! HTTP method and transport lifecycle enumerations.
//!
//! # Design
//! Plain-data enums with canonical string forms. `Method` names the verbs
//! the helper can issue; `Event` names the four lifecycle outcomes a
//! transport can report, of which exactly one settles each request.

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle outcome of one transport exchange.
///
/// `Load` covers every completed HTTP response regardless of status code;
/// status interpretation belongs to the orchestrator. The other three are
/// transport-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Load,
    Abort,
    Error,
    Timeout,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Load => "load",
            Event::Abort => "abort",
            Event::Error => "error",
            Event::Timeout => "timeout",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
