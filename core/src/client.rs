//! Request orchestration: configuration layering, one transport exchange,
//! and outcome normalization.
//!
//! # Design
//! `Client` holds only its override layer and carries no state between
//! calls. Each request computes its effective configuration with the pure
//! merge, creates a fresh transport from the configured factory, drives it
//! to a single lifecycle event, and normalizes the result into
//! `Result<Response>`. No retries, no redirect handling, no timeouts of
//! its own.

use crate::config::{self, Body, Config, Options, Params};
use crate::error::{Error, Result};
use crate::http::{Event, Method};
use crate::response::{Payload, Response};
use crate::transport::{AbortHandle, Listeners};

/// HTTP request helper with layered configuration.
#[derive(Default)]
pub struct Client {
    overrides: Options,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge `opts` into this client's overrides, per key, for all
    /// subsequent calls. No validation is performed; merging empty options
    /// changes nothing.
    pub fn configure(&mut self, opts: Options) {
        self.overrides.merge(opts);
    }

    /// Issue one request described by `args` layered over this client's
    /// overrides and the built-in defaults.
    pub fn request(&self, mut args: Options) -> Result<Response> {
        // The abort hook is drawn from the call arguments, never from the
        // merged configuration.
        let abort_hook = args.abort.take();
        let cfg = config::effective(&Config::default(), &self.overrides, &args);

        let mut transport = (cfg.transport)();
        let handle = AbortHandle::default();
        if let Some(hook) = abort_hook {
            transport.register_abort(handle.clone());
            hook(handle.clone());
        }

        let url = cfg.url.as_deref().ok_or(Error::NoUrl)?;
        let target = config::target_url(url, cfg.params.as_ref())?;

        transport.open(cfg.method, &target);
        // credentials flag is only writable once the transport is open
        transport.set_with_credentials(cfg.with_credentials);
        for (name, value) in &cfg.headers {
            transport.set_header(name, value);
        }

        let listeners = Listeners::new(cfg.events.clone());

        if handle.is_aborted() {
            transport.abort();
            log::debug!("{} {target} aborted before send", cfg.method);
            return Err(Error::Transport {
                event: Event::Abort,
                response: Response::from_transport(transport, None),
            });
        }

        let body = match (&cfg.body, cfg.raw) {
            (Some(Body::Structured(value)), false) => Some(cfg.dump.dump(value)?),
            // raw mode bypasses the configured codec
            (Some(Body::Structured(value)), true) => Some(value.to_string()),
            (Some(Body::Text(text)), _) => Some(text.clone()),
            (None, _) => None,
        };

        log::debug!("{} {target}", cfg.method);
        let event = transport.send(body, &listeners);
        listeners.emit(event.as_str(), transport.as_ref());
        log::debug!(
            "{} {target} settled: {event} (status {})",
            cfg.method,
            transport.status()
        );

        match event {
            Event::Load => {
                let status = transport.status();
                if (200..300).contains(&status) {
                    let data = match transport.response_text() {
                        Some(text) if !text.is_empty() => Some(if cfg.raw {
                            Payload::Text(text.to_string())
                        } else {
                            Payload::Json(cfg.load.load(text)?)
                        }),
                        _ => None,
                    };
                    Ok(Response::from_transport(transport, data))
                } else {
                    Err(Error::Status(Response::from_transport(transport, None)))
                }
            }
            event => Err(Error::Transport {
                event,
                response: Response::from_transport(transport, None),
            }),
        }
    }

    /// GET with optional query parameters.
    pub fn get(&self, url: &str, params: Option<Params>, extra: Options) -> Result<Response> {
        self.verb(Method::Get, url, None, params, extra)
    }

    pub fn put(&self, url: &str, data: impl Into<Body>, extra: Options) -> Result<Response> {
        self.verb(Method::Put, url, Some(data.into()), None, extra)
    }

    pub fn post(&self, url: &str, data: impl Into<Body>, extra: Options) -> Result<Response> {
        self.verb(Method::Post, url, Some(data.into()), None, extra)
    }

    pub fn patch(&self, url: &str, data: impl Into<Body>, extra: Options) -> Result<Response> {
        self.verb(Method::Patch, url, Some(data.into()), None, extra)
    }

    pub fn del(&self, url: &str, extra: Options) -> Result<Response> {
        self.verb(Method::Delete, url, None, None, extra)
    }

    pub fn options(&self, url: &str, extra: Options) -> Result<Response> {
        self.verb(Method::Options, url, None, None, extra)
    }

    fn verb(
        &self,
        method: Method,
        url: &str,
        body: Option<Body>,
        params: Option<Params>,
        extra: Options,
    ) -> Result<Response> {
        let mut args = Options {
            method: Some(method),
            url: Some(url.to_string()),
            body,
            params,
            ..Options::default()
        };
        // extra wins over the fixed fields, mirroring the merge order
        args.merge(extra);
        self.request(args)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use crate::codec::Deserializer;
    use crate::transport::{Transport, TransportFactory};

    use super::*;

    /// Everything the orchestrator did to the transport, shared out of the
    /// factory so assertions survive the transport being consumed.
    #[derive(Default)]
    struct TransportLog {
        opened: Option<(Method, String)>,
        credentials: Option<bool>,
        headers: Vec<(String, String)>,
        sent: bool,
        sent_body: Option<String>,
        abort_called: bool,
    }

    /// Scripted transport: records configuration calls and replays a fixed
    /// lifecycle outcome.
    struct MockTransport {
        event: Event,
        status: u16,
        body: Option<String>,
        settled: bool,
        abort: AbortHandle,
        log: Arc<Mutex<TransportLog>>,
    }

    impl Transport for MockTransport {
        fn open(&mut self, method: Method, url: &str) {
            self.log.lock().unwrap().opened = Some((method, url.to_string()));
        }
        fn set_with_credentials(&mut self, enabled: bool) {
            self.log.lock().unwrap().credentials = Some(enabled);
        }
        fn with_credentials(&self) -> bool {
            self.log.lock().unwrap().credentials.unwrap_or(false)
        }
        fn set_header(&mut self, name: &str, value: &str) {
            self.log
                .lock()
                .unwrap()
                .headers
                .push((name.to_string(), value.to_string()));
        }
        fn register_abort(&mut self, handle: AbortHandle) {
            self.abort = handle;
        }
        fn send(&mut self, body: Option<String>, listeners: &Listeners) -> Event {
            {
                let mut log = self.log.lock().unwrap();
                log.sent = true;
                log.sent_body = body;
            }
            if self.abort.is_aborted() {
                return Event::Abort;
            }
            listeners.emit("loadstart", &*self);
            self.settled = self.event == Event::Load;
            self.event
        }
        fn abort(&mut self) {
            self.log.lock().unwrap().abort_called = true;
        }
        fn status(&self) -> u16 {
            if self.settled {
                self.status
            } else {
                0
            }
        }
        fn response_text(&self) -> Option<&str> {
            if self.settled {
                self.body.as_deref()
            } else {
                None
            }
        }
        fn response_header(&self, _name: &str) -> Option<&str> {
            None
        }
    }

    fn scripted(
        event: Event,
        status: u16,
        body: Option<&str>,
    ) -> (TransportFactory, Arc<Mutex<TransportLog>>) {
        let log = Arc::new(Mutex::new(TransportLog::default()));
        let shared = Arc::clone(&log);
        let body = body.map(str::to_string);
        let factory: TransportFactory = Arc::new(move || {
            Box::new(MockTransport {
                event,
                status,
                body: body.clone(),
                settled: false,
                abort: AbortHandle::default(),
                log: Arc::clone(&shared),
            }) as Box<dyn Transport>
        });
        (factory, log)
    }

    fn ok_factory(status: u16, body: Option<&str>) -> (TransportFactory, Arc<Mutex<TransportLog>>) {
        scripted(Event::Load, status, body)
    }

    #[test]
    fn every_method_reaches_the_transport_unchanged() {
        let methods = [
            Method::Get,
            Method::Put,
            Method::Post,
            Method::Patch,
            Method::Delete,
            Method::Options,
        ];
        for method in methods {
            let (factory, log) = ok_factory(200, None);
            let client = Client::new();
            client
                .request(Options {
                    method: Some(method),
                    url: Some("/anywhere".to_string()),
                    transport: Some(factory),
                    ..Options::default()
                })
                .unwrap();
            let log = log.lock().unwrap();
            assert_eq!(log.opened.as_ref().unwrap().0, method);
        }
    }

    #[test]
    fn get_sends_default_headers_params_and_no_body() {
        let (factory, log) = ok_factory(200, Some("[]"));
        let client = Client::new();
        let params = vec![("page".to_string(), "2".to_string())];
        client
            .get(
                "/items",
                Some(params),
                Options {
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        let log = log.lock().unwrap();
        let (method, url) = log.opened.clone().unwrap();
        assert_eq!(method, Method::Get);
        assert_eq!(url, "/items?page=2");
        assert_eq!(
            log.headers,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ]
        );
        assert_eq!(log.sent_body, None);
        assert_eq!(log.credentials, Some(false));
    }

    #[test]
    fn params_discard_the_embedded_query_string() {
        let (factory, log) = ok_factory(200, None);
        let client = Client::new();
        let params = vec![("q".to_string(), "rust".to_string())];
        client
            .get(
                "/search?stale=1",
                Some(params),
                Options {
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        assert_eq!(
            log.lock().unwrap().opened.as_ref().unwrap().1,
            "/search?q=rust"
        );
    }

    #[test]
    fn missing_url_fails_before_any_transport_interaction() {
        let (factory, log) = ok_factory(200, None);
        let client = Client::new();
        let err = client
            .request(Options {
                method: Some(Method::Get),
                transport: Some(factory),
                ..Options::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::NoUrl));
        let log = log.lock().unwrap();
        assert!(log.opened.is_none());
        assert!(log.headers.is_empty());
        assert!(!log.sent);
    }

    #[test]
    fn call_args_headers_win_over_client_overrides() {
        let (factory, log) = ok_factory(200, None);
        let mut client = Client::new();
        client.configure(Options {
            headers: Some(
                [("Accept".to_string(), "text/plain".to_string())]
                    .into_iter()
                    .collect(),
            ),
            ..Options::default()
        });
        client
            .request(Options {
                url: Some("/items".to_string()),
                headers: Some(
                    [("Accept".to_string(), "text/xml".to_string())]
                        .into_iter()
                        .collect(),
                ),
                transport: Some(factory),
                ..Options::default()
            })
            .unwrap();
        // shallow merge: the whole map was replaced by the last layer
        assert_eq!(
            log.lock().unwrap().headers,
            vec![("Accept".to_string(), "text/xml".to_string())]
        );
    }

    #[test]
    fn configure_with_empty_options_is_a_noop() {
        let (factory, log) = ok_factory(200, None);
        let mut client = Client::new();
        client.configure(Options::default());
        client
            .get(
                "/items",
                None,
                Options {
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        assert_eq!(log.lock().unwrap().headers.len(), 2);
    }

    #[test]
    fn success_with_body_decodes_through_load() {
        let (factory, _log) = ok_factory(200, Some(r#"{"name":"a"}"#));
        let client = Client::new();
        let response = client
            .get(
                "/items/1",
                None,
                Options {
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.data, Some(Payload::Json(json!({ "name": "a" }))));
        assert_eq!(response.body.as_deref(), Some(r#"{"name":"a"}"#));
    }

    #[test]
    fn success_with_empty_body_carries_no_data() {
        let (factory, _log) = ok_factory(204, Some(""));
        let client = Client::new();
        let response = client
            .del(
                "/items/1",
                Options {
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        assert_eq!(response.status, 204);
        assert!(response.data.is_none());
    }

    #[test]
    fn failure_status_rejects_without_data_regardless_of_body() {
        let (factory, _log) = ok_factory(404, Some(r#"{"detail":"missing"}"#));
        let client = Client::new();
        let err = client
            .get(
                "/items/1",
                None,
                Options {
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap_err();
        let Error::Status(response) = err else {
            panic!("expected status error");
        };
        assert_eq!(response.status, 404);
        assert!(response.data.is_none());
        assert_eq!(response.body.as_deref(), Some(r#"{"detail":"missing"}"#));
    }

    #[test]
    fn structured_body_is_dumped_to_json() {
        let (factory, log) = ok_factory(201, Some(r#"{"name":"a"}"#));
        let client = Client::new();
        let response = client
            .post(
                "/items",
                json!({ "name": "a" }),
                Options {
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        assert_eq!(
            log.lock().unwrap().sent_body.as_deref(),
            Some(r#"{"name":"a"}"#)
        );
        assert_eq!(response.data, Some(Payload::Json(json!({ "name": "a" }))));
    }

    #[test]
    fn raw_mode_passes_text_through_both_ways() {
        let (factory, log) = ok_factory(200, Some("plain response"));
        let client = Client::new();
        let response = client
            .post(
                "/echo",
                "plain payload",
                Options {
                    raw: Some(true),
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        assert_eq!(
            log.lock().unwrap().sent_body.as_deref(),
            Some("plain payload")
        );
        assert_eq!(response.data, Some(Payload::Text("plain response".to_string())));
    }

    #[test]
    fn raw_mode_bypasses_the_configured_dump() {
        struct PanickyDump;
        impl crate::codec::Serializer for PanickyDump {
            fn dump(&self, _value: &serde_json::Value) -> Result<String> {
                panic!("dump must not run in raw mode");
            }
        }
        let (factory, log) = ok_factory(200, None);
        let client = Client::new();
        client
            .post(
                "/items",
                json!({ "n": 1 }),
                Options {
                    raw: Some(true),
                    dump: Some(Arc::new(PanickyDump)),
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        assert_eq!(log.lock().unwrap().sent_body.as_deref(), Some(r#"{"n":1}"#));
    }

    #[test]
    fn decode_failure_surfaces_as_decode_error() {
        let (factory, _log) = ok_factory(200, Some("not json"));
        let client = Client::new();
        let err = client
            .get(
                "/items",
                None,
                Options {
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn custom_deserializer_replaces_the_default_wholesale() {
        struct Constant;
        impl Deserializer for Constant {
            fn load(&self, _text: &str) -> Result<serde_json::Value> {
                Ok(json!({ "custom": true }))
            }
        }
        let (factory, _log) = ok_factory(200, Some("anything at all"));
        let client = Client::new();
        let response = client
            .get(
                "/items",
                None,
                Options {
                    load: Some(Arc::new(Constant)),
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        assert_eq!(response.data, Some(Payload::Json(json!({ "custom": true }))));
    }

    #[test]
    fn abort_hook_cancels_before_send_and_aborts_the_transport() {
        let (factory, log) = ok_factory(200, Some("never seen"));
        let client = Client::new();
        let err = client
            .request(Options {
                url: Some("/items".to_string()),
                transport: Some(factory),
                abort: Some(Box::new(|handle: AbortHandle| handle.abort())),
                ..Options::default()
            })
            .unwrap_err();
        let Error::Transport { event, response } = err else {
            panic!("expected transport error");
        };
        assert_eq!(event, Event::Abort);
        assert_eq!(response.status, 0);
        assert!(response.data.is_none());
        let log = log.lock().unwrap();
        assert!(log.abort_called);
        assert!(!log.sent);
    }

    #[test]
    fn transport_error_rejects_with_the_event() {
        let (factory, _log) = scripted(Event::Error, 0, None);
        let client = Client::new();
        let err = client
            .get(
                "/items",
                None,
                Options {
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Transport {
                event: Event::Error,
                ..
            }
        ));
    }

    #[test]
    fn timeout_rejects_with_the_event_and_no_data() {
        let (factory, _log) = scripted(Event::Timeout, 0, None);
        let client = Client::new();
        let err = client
            .get(
                "/slow",
                None,
                Options {
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap_err();
        let Error::Transport { event, response } = err else {
            panic!("expected transport error");
        };
        assert_eq!(event, Event::Timeout);
        assert_eq!(response.status, 0);
        assert!(response.data.is_none());
    }

    #[test]
    fn extra_event_handlers_receive_the_transport() {
        let seen: Arc<Mutex<Vec<(String, u16)>>> = Arc::new(Mutex::new(Vec::new()));
        let mut events: BTreeMap<String, crate::transport::EventHandler> = BTreeMap::new();
        for name in ["loadstart", "load"] {
            let seen = Arc::clone(&seen);
            events.insert(
                name.to_string(),
                Arc::new(move |transport: &dyn Transport| {
                    seen.lock().unwrap().push((name.to_string(), transport.status()));
                }),
            );
        }
        let (factory, _log) = ok_factory(200, Some("{}"));
        let client = Client::new();
        client
            .get(
                "/items",
                None,
                Options {
                    events: Some(events),
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        let seen = seen.lock().unwrap();
        // loadstart fires inside send before the response exists
        assert_eq!(seen[0], ("loadstart".to_string(), 0));
        assert_eq!(seen[1], ("load".to_string(), 200));
    }

    #[test]
    fn verb_wrapper_extras_override_fixed_fields() {
        let (factory, log) = ok_factory(200, None);
        let client = Client::new();
        client
            .get(
                "/items",
                None,
                Options {
                    // mirrors the merge order: explicit args win
                    method: Some(Method::Options),
                    transport: Some(factory),
                    ..Options::default()
                },
            )
            .unwrap();
        assert_eq!(log.lock().unwrap().opened.as_ref().unwrap().0, Method::Options);
    }
}
