//! A fixed response, optionally limited to one path and method.

use super::{ModuleSettings, ModuleSpec};
use chainres_core::{
    BoxError, ChainModule, Content, Headers, ModuleRef, RequestContext, ResponseOutcome,
};
use serde::Deserialize;
use std::sync::Arc;

/// Descriptor kind name.
pub const KIND: &str = "static";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Options {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    method: Option<String>,
    content: String,
    #[serde(default)]
    headers: Headers,
    #[serde(default)]
    continue_next: bool,
}

/// Replies with a configured body and headers.
#[derive(Debug, Clone)]
pub struct StaticContent {
    settings: ModuleSettings,
    path: Option<String>,
    method: Option<String>,
    response: ResponseOutcome,
}

impl StaticContent {
    /// Reply to every request with `response`.
    pub fn new(settings: ModuleSettings, response: ResponseOutcome) -> Self {
        Self {
            settings,
            path: None,
            method: None,
            response,
        }
    }

    /// Only reply to this exact path.
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Only reply to this method (case-insensitive).
    pub fn for_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub(crate) fn from_spec(spec: &ModuleSpec) -> Result<ModuleRef, BoxError> {
        let options: Options = spec.options()?;
        Ok(Arc::new(Self {
            settings: spec.settings.clone(),
            path: options.path,
            method: options.method,
            response: ResponseOutcome {
                content: Some(Content::Text(options.content)),
                headers: options.headers,
                continue_next: options.continue_next,
            },
        }))
    }
}

impl ChainModule for StaticContent {
    type Matched = ();

    fn name(&self) -> &str {
        &self.settings.name
    }

    fn enabled(&self) -> bool {
        self.settings.enabled
    }

    fn priority(&self) -> i32 {
        self.settings.priority
    }

    async fn matches(&self, ctx: &RequestContext) -> Result<Option<()>, BoxError> {
        let path_ok = self.path.as_deref().is_none_or(|path| path == ctx.path());
        let method_ok = self
            .method
            .as_deref()
            .is_none_or(|method| method.eq_ignore_ascii_case(ctx.method().as_str()));
        Ok((path_ok && method_ok).then_some(()))
    }

    async fn respond(
        &self,
        _ctx: &RequestContext,
        _matched: (),
        _previous: Option<&ResponseOutcome>,
        _handled: &[ModuleRef],
    ) -> Result<Option<ResponseOutcome>, BoxError> {
        Ok(Some(self.response.clone()))
    }
}
