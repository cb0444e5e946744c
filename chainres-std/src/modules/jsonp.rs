//! Wrap the composed response in a JSONP callback.
//!
//! Jsonp produces no content of its own; it rewrites what the modules before
//! it produced, so it normally runs last ([`JSONP_PRIORITY`]).

use super::{ModuleSettings, ModuleSpec};
use chainres_core::{BoxError, ChainModule, ModuleRef, RequestContext, ResponseOutcome};
use serde::Deserialize;
use std::sync::Arc;

/// Descriptor kind name.
pub const KIND: &str = "jsonp";

/// Priority of [`Jsonp::new`], low enough to run after content producers.
pub const JSONP_PRIORITY: i32 = 5;

/// `Content-Type` of a wrapped response.
pub const JSONP_CONTENT_TYPE: &str = "application/x-javascript; charset=utf-8";

fn default_callback_params() -> Vec<String> {
    vec!["callback".to_string()]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Options {
    #[serde(default = "default_callback_params")]
    callback_params: Vec<String>,
}

/// Wraps the previous response as `callback(content)`.
#[derive(Debug, Clone)]
pub struct Jsonp {
    settings: ModuleSettings,
    callback_params: Vec<String>,
}

impl Jsonp {
    /// Look for the callback name in any of `callback_params`, in order.
    pub fn new<I, S>(callback_params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            settings: ModuleSettings::new(KIND).with_priority(JSONP_PRIORITY),
            callback_params: callback_params.into_iter().map(Into::into).collect(),
        }
    }

    /// Replace name, priority and enabled state.
    pub fn with_settings(mut self, settings: ModuleSettings) -> Self {
        self.settings = settings;
        self
    }

    pub(crate) fn from_spec(spec: &ModuleSpec) -> Result<ModuleRef, BoxError> {
        let options: Options = spec.options()?;
        if options.callback_params.is_empty() {
            return Err("`callback_params` must not be empty".into());
        }
        Ok(Arc::new(Self {
            settings: spec.settings.clone(),
            callback_params: options.callback_params,
        }))
    }
}

/// Callback names are restricted to JavaScript identifiers and member paths.
fn is_callback_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'))
}

impl ChainModule for Jsonp {
    type Matched = String;

    fn name(&self) -> &str {
        &self.settings.name
    }

    fn enabled(&self) -> bool {
        self.settings.enabled
    }

    fn priority(&self) -> i32 {
        self.settings.priority
    }

    async fn matches(&self, ctx: &RequestContext) -> Result<Option<String>, BoxError> {
        let callback = self
            .callback_params
            .iter()
            .find_map(|param| ctx.query_param(param).filter(|value| !value.is_empty()));
        match callback {
            Some(name) if is_callback_name(name) => Ok(Some(name.to_string())),
            Some(name) => Err(format!("refusing JSONP callback name `{name}`").into()),
            None => Ok(None),
        }
    }

    async fn respond(
        &self,
        _ctx: &RequestContext,
        callback: String,
        previous: Option<&ResponseOutcome>,
        _handled: &[ModuleRef],
    ) -> Result<Option<ResponseOutcome>, BoxError> {
        let Some(previous) = previous else {
            return Ok(None);
        };
        let body = previous
            .content
            .as_ref()
            .map(|content| content.to_text().into_owned())
            .unwrap_or_default();

        let mut wrapped = previous.clone().header("Content-Type", JSONP_CONTENT_TYPE);
        wrapped.content = Some(format!("{callback}({body})").into());
        Ok(Some(wrapped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainres_core::Content;
    use http::Request;

    fn ctx(uri: &str) -> RequestContext {
        RequestContext::from_request(Request::get(uri).body(()).unwrap())
    }

    #[tokio::test]
    async fn wraps_previous_content() {
        let module = Jsonp::new(["cb", "callback"]);
        let request = ctx("/data?callback=handle&cb=");
        let callback = module.matches(&request).await.unwrap().unwrap();
        assert_eq!(callback, "handle");

        let previous = ResponseOutcome::with_content("{\"a\":1}").header("X-Mock", "1");
        let response = module
            .respond(&request, callback, Some(&previous), &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.content, Some(Content::Text("handle({\"a\":1})".into())));
        assert_eq!(response.headers["Content-Type"], JSONP_CONTENT_TYPE);
        assert_eq!(response.headers["X-Mock"], "1");
    }

    #[tokio::test]
    async fn passes_missing_response_through() {
        let module = Jsonp::new(["callback"]);
        let response = module
            .respond(&ctx("/?callback=f"), "f".to_string(), None, &[])
            .await
            .unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn rejects_unsafe_callback_names() {
        let module = Jsonp::new(["callback"]);
        assert!(module.matches(&ctx("/?callback=alert(1)")).await.is_err());
        assert!(module.matches(&ctx("/?callback=app.cb_1")).await.unwrap().is_some());
        assert!(module.matches(&ctx("/")).await.unwrap().is_none());
    }

    #[test]
    fn defaults_to_low_priority() {
        assert_eq!(ChainModule::priority(&Jsonp::new(["callback"])), JSONP_PRIORITY);
    }
}
