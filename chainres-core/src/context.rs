//! # Request Context
//!
//! The immutable view of an inbound request that every module sees.
//!
//! A [`RequestContext`] is assembled exactly once per request, before the
//! match phase starts. Modules only ever borrow it, and the raw request head
//! it wraps is shared, never mutated.

use http::{Method, Request, request::Parts};
use std::{collections::HashMap, sync::Arc};

/// Header used by browsers' `XMLHttpRequest` shims to flag ajax calls.
pub const REQUESTED_WITH: &str = "x-requested-with";

/// Per-request view handed to [`ChainModule::matches`] and
/// [`ChainModule::respond`].
///
/// [`ChainModule::matches`]: crate::ChainModule::matches
/// [`ChainModule::respond`]: crate::ChainModule::respond
#[derive(Debug, Clone)]
pub struct RequestContext {
    original_url: String,
    path: String,
    query: HashMap<String, String>,
    xhr: bool,
    request: Arc<Parts>,
}

impl RequestContext {
    /// Build the context from a request head.
    pub fn from_parts(parts: Parts) -> Self {
        let original_url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let raw_path = parts.uri.path();
        let path = urlencoding::decode(raw_path)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| raw_path.to_string());

        // Repeated keys collapse to the last value.
        let query = parts
            .uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect::<HashMap<_, _>>()
            })
            .unwrap_or_default();

        let xhr = parts
            .headers
            .get(REQUESTED_WITH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

        Self {
            original_url,
            path,
            query,
            xhr,
            request: Arc::new(parts),
        }
    }

    /// Build the context from a full request, dropping its body.
    pub fn from_request<B>(request: Request<B>) -> Self {
        let (parts, _body) = request.into_parts();
        Self::from_parts(parts)
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.request.method
    }

    /// The URL as received, including the query string.
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    /// The percent-decoded path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parsed query parameters.
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// A single query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Whether the request was sent as `X-Requested-With: XMLHttpRequest`.
    pub fn is_xhr(&self) -> bool {
        self.xhr
    }

    /// Look up a request header. Non-UTF-8 values are reported as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    /// The raw request head.
    pub fn request(&self) -> &Parts {
        &self.request
    }

    /// Recover the request head, e.g. to forward the request to the host.
    ///
    /// If a module kept a clone of this context alive, the head is rebuilt
    /// from its method, URI, version and headers; extensions are lost in
    /// that case.
    pub fn into_parts(self) -> Parts {
        match Arc::try_unwrap(self.request) {
            Ok(parts) => parts,
            Err(shared) => {
                let (mut parts, ()) = Request::new(()).into_parts();
                parts.method = shared.method.clone();
                parts.uri = shared.uri.clone();
                parts.version = shared.version;
                parts.headers = shared.headers.clone();
                parts
            }
        }
    }
}
