//! Response values threaded through the module chain.

use std::collections::BTreeMap;

/// Header map carried by a [`ResponseOutcome`].
///
/// Names are case-sensitive; a later module writing the same name replaces
/// the earlier value.
pub type Headers = BTreeMap<String, String>;

/// A response body, either text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// UTF-8 text.
    Text(String),
    /// Arbitrary binary payload.
    Binary(Vec<u8>),
}

impl Content {
    /// The body as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(text) => text.as_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }

    /// Length of the body in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// The body as text; binary bodies are decoded lossily.
    pub fn to_text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Content::Text(text) => std::borrow::Cow::Borrowed(text),
            Content::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    /// Consume the body into owned bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Content::Text(text) => text.into_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Binary(bytes)
    }
}

/// What a module hands to the next module in the chain.
///
/// Every field is optional. The dispatcher only emits a body when
/// [`content`](Self::content) is present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseOutcome {
    /// Response body.
    pub content: Option<Content>,
    /// Response headers.
    pub headers: Headers,
    /// Defer to the host even after the body is emitted.
    pub continue_next: bool,
}

impl ResponseOutcome {
    /// An empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// A response with the given body.
    pub fn with_content(content: impl Into<Content>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Ask the dispatcher to also defer to the host.
    pub fn continue_next(mut self, continue_next: bool) -> Self {
        self.continue_next = continue_next;
        self
    }

    /// Whether there is a non-empty body to emit.
    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }
}
