//! Tower integration.
//!
//! [`ChainResponseLayer`] puts a [`Dispatcher`] in front of any `http`
//! service. The wrapped service is the "next handler": it only runs when the
//! dispatch defers.
//!
//! | Dispatch | Result |
//! |---|---|
//! | body, no defer | the composed response; inner service not called |
//! | no body, defer | inner response, untouched |
//! | body and defer (`continue_next`) | inner response headers, composed headers appended, composed body |
//!
//! # Example
//!
//! ```rust,ignore
//! use chainres::tower::ChainResponseLayer;
//! use tower::ServiceBuilder;
//!
//! let service = ServiceBuilder::new()
//!     .layer(ChainResponseLayer::new(dispatcher))
//!     .service(app);
//! ```

use crate::{dispatcher::Dispatcher, host::Dispatch};
use bytes::Bytes;
use chainres_core::RequestContext;
use http::{
    HeaderMap, Request, Response,
    header::{CONTENT_LENGTH, HeaderName, HeaderValue},
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// Wraps services in a [`ChainResponseService`].
#[derive(Debug, Clone)]
pub struct ChainResponseLayer {
    dispatcher: Dispatcher,
}

impl ChainResponseLayer {
    /// Create a layer dispatching through `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

impl<S> Layer<S> for ChainResponseLayer {
    type Service = ChainResponseService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ChainResponseService {
            inner,
            dispatcher: self.dispatcher.clone(),
        }
    }
}

/// Runs the dispatcher before an inner `http` service.
#[derive(Debug, Clone)]
pub struct ChainResponseService<S> {
    inner: S,
    dispatcher: Dispatcher,
}

impl<S> ChainResponseService<S> {
    /// Wrap `inner`.
    pub fn new(inner: S, dispatcher: Dispatcher) -> Self {
        Self { inner, dispatcher }
    }

    /// Get a reference to the inner service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for ChainResponseService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
    ReqBody: Send + 'static,
    ResBody: From<Bytes> + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The clone may not be ready; keep the one `poll_ready` was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let dispatcher = self.dispatcher.clone();

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let ctx = RequestContext::from_parts(parts);
            let dispatch = dispatcher.dispatch(&ctx).await;
            let headers = header_map(&dispatch, dispatcher.config().debug);

            if !dispatch.defer {
                let content = dispatch.body.map(|c| c.into_bytes()).unwrap_or_default();
                let mut response = Response::new(ResBody::from(Bytes::from(content)));
                append_headers(response.headers_mut(), headers);
                return Ok(response);
            }

            let request = Request::from_parts(ctx.into_parts(), body);
            let mut response = inner.call(request).await?;
            append_headers(response.headers_mut(), headers);
            if let Some(content) = dispatch.body {
                response.headers_mut().remove(CONTENT_LENGTH);
                *response.body_mut() = ResBody::from(Bytes::from(content.into_bytes()));
            }
            Ok(response)
        })
    }
}

/// The dispatch headers that are valid HTTP headers.
fn header_map(dispatch: &Dispatch, debug: bool) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in &dispatch.headers {
        let parsed = HeaderName::from_bytes(name.as_bytes())
            .ok()
            .zip(HeaderValue::from_str(value).ok());
        match parsed {
            Some((name, value)) => {
                map.append(name, value);
            }
            None => {
                if debug {
                    tracing::warn!(header = %name, "skipping invalid response header");
                }
            }
        }
    }
    map
}

fn append_headers(target: &mut HeaderMap, headers: HeaderMap) {
    let mut current = None;
    for (name, value) in headers {
        // `HeaderMap::into_iter` yields the name only for the first value.
        if let Some(name) = name {
            current = Some(name);
        }
        if let Some(name) = &current {
            target.append(name.clone(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use chainres_core::ResponseOutcome;
    use chainres_std::testing::ScriptedModule;
    use std::convert::Infallible;
    use tower::{ServiceExt, service_fn};

    async fn app(_request: Request<()>) -> Result<Response<Bytes>, Infallible> {
        let mut response = Response::new(Bytes::from_static(b"from app"));
        response
            .headers_mut()
            .insert("x-app", HeaderValue::from_static("1"));
        Ok(response)
    }

    fn chain_layer(reply: ResponseOutcome) -> ChainResponseLayer {
        let dispatcher = Dispatcher::new(
            [ScriptedModule::new("m").reply(reply).into_ref()],
            ChainConfig::new().with_debug(true),
        );
        ChainResponseLayer::new(dispatcher)
    }

    fn get(uri: &str) -> Request<()> {
        Request::get(uri).body(()).unwrap()
    }

    #[tokio::test]
    async fn composed_body_short_circuits() {
        let reply = ResponseOutcome::with_content("composed").header("X-Chain", "yes");
        let response = chain_layer(reply).layer(service_fn(app)).oneshot(get("/a")).await.unwrap();

        assert_eq!(response.body(), &Bytes::from_static(b"composed"));
        assert_eq!(response.headers()["x-chain"], "yes");
        assert!(response.headers().get("x-app").is_none());
    }

    #[tokio::test]
    async fn empty_content_defers_untouched() {
        let reply = ResponseOutcome::new().header("X-Chain", "yes");
        let response = chain_layer(reply).layer(service_fn(app)).oneshot(get("/a")).await.unwrap();

        assert_eq!(response.body(), &Bytes::from_static(b"from app"));
        assert!(response.headers().get("x-chain").is_none());
        assert_eq!(response.headers()["x-app"], "1");
    }

    #[tokio::test]
    async fn continue_next_keeps_inner_headers() {
        let reply = ResponseOutcome::with_content("composed")
            .header("X-App", "2")
            .continue_next(true);
        let response = chain_layer(reply).layer(service_fn(app)).oneshot(get("/a")).await.unwrap();

        assert_eq!(response.body(), &Bytes::from_static(b"composed"));
        let values: Vec<_> = response
            .headers()
            .get_all("x-app")
            .iter()
            .map(|value| value.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn invalid_headers_are_skipped() {
        let reply = ResponseOutcome::with_content("x").header("bad header", "v");
        let response = chain_layer(reply).layer(service_fn(app)).oneshot(get("/a")).await.unwrap();
        assert!(response.headers().is_empty());
    }
}
