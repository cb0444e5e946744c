//! Host side of a dispatch.
//!
//! A [`Dispatch`] describes what a request's outcome does to the host
//! framework: headers to append, an optional body to send, and whether to
//! hand the request on to the next handler. [`Dispatch::apply`] drives any
//! [`Host`] with it, in that order.

use chainres_core::{ChainState, Content};

/// Response sink of a host framework.
pub trait Host {
    /// Append a header value. Existing values of the same name are kept.
    fn append_header(&mut self, name: &str, value: &str);

    /// Send the response body.
    fn send(&mut self, content: Content);

    /// Pass the request to the next handler.
    fn defer(&mut self);
}

/// Outward effect of dispatching one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Headers to append, in application order.
    pub headers: Vec<(String, String)>,
    /// Body to send, if any.
    pub body: Option<Content>,
    /// Whether the next handler runs.
    pub defer: bool,
}

impl Dispatch {
    /// Do nothing but hand the request on.
    pub fn deferred() -> Self {
        Self {
            defer: true,
            ..Self::default()
        }
    }

    /// Answer to a switch request.
    pub fn toggled(on: bool) -> Self {
        Self {
            body: Some(Content::Text(format!("current switch is {on}"))),
            ..Self::default()
        }
    }

    /// Translate the terminal chain state.
    ///
    /// A missing response, or one without content, emits nothing and
    /// defers. Otherwise its headers and content are emitted, deferring as
    /// well when the response asks to continue.
    pub fn from_state(state: ChainState) -> Self {
        match state.previous_response {
            Some(response) if response.has_content() => Self {
                headers: response.headers.into_iter().collect(),
                body: response.content,
                defer: response.continue_next,
            },
            _ => Self::deferred(),
        }
    }

    /// Whether this dispatch produces a body.
    pub fn is_handled(&self) -> bool {
        self.body.is_some()
    }

    /// Drive `host`: headers, then body, then defer.
    pub fn apply<H: Host + ?Sized>(self, host: &mut H) {
        for (name, value) in &self.headers {
            host.append_header(name, value);
        }
        if let Some(body) = self.body {
            host.send(body);
        }
        if self.defer {
            host.defer();
        }
    }
}

/// A [`Host`] that records what it was told.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingHost {
    /// Appended headers, in order.
    pub headers: Vec<(String, String)>,
    /// Sent bodies.
    pub sent: Vec<Content>,
    /// How often `defer` was called.
    pub deferred: usize,
}

impl RecordingHost {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All values appended for `name`, compared case-insensitively.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// The body sent, as text.
    pub fn body_text(&self) -> Option<String> {
        self.sent.first().map(|body| body.to_text().into_owned())
    }
}

impl Host for RecordingHost {
    fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn send(&mut self, content: Content) {
        self.sent.push(content);
    }

    fn defer(&mut self) {
        self.deferred += 1;
    }
}
