//! Serve a fixed endpoint from files selected by a query parameter.
//!
//! With `path = "/getdata"` and the default `param = "_action"`, a request
//! to `/getdata?_action=users` is served from `users` (or `users.<ext>`)
//! under the module's directory.

use super::{
    ModuleSettings, ModuleSpec,
    files::{ContentTypes, FileMatch, file_response, locate_file},
};
use chainres_core::{BoxError, ChainModule, ModuleRef, RequestContext, ResponseOutcome};
use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf, sync::Arc};

/// Descriptor kind name.
pub const KIND: &str = "url-query-map";

/// Query parameter used when none is configured.
pub const DEFAULT_PARAM: &str = "_action";

fn default_param() -> String {
    DEFAULT_PARAM.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Options {
    path: String,
    #[serde(default = "default_param")]
    param: String,
    dir: PathBuf,
    #[serde(default)]
    content_types: HashMap<String, String>,
}

/// Maps a query parameter of one endpoint to files under a directory.
#[derive(Debug, Clone)]
pub struct UrlQueryMap {
    settings: ModuleSettings,
    path: String,
    param: String,
    dir: PathBuf,
    content_types: ContentTypes,
}

impl UrlQueryMap {
    /// Serve `path` from files under `dir`, selected by [`DEFAULT_PARAM`].
    pub fn new(settings: ModuleSettings, path: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            path: path.into(),
            param: default_param(),
            dir: dir.into(),
            content_types: ContentTypes::default(),
        }
    }

    /// Select files by another query parameter.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    pub(crate) fn from_spec(spec: &ModuleSpec) -> Result<ModuleRef, BoxError> {
        let options: Options = spec.options()?;
        Ok(Arc::new(Self {
            settings: spec.settings.clone(),
            path: options.path,
            param: options.param,
            dir: spec.resolve(&options.dir),
            content_types: ContentTypes::with_overrides(&options.content_types),
        }))
    }
}

impl ChainModule for UrlQueryMap {
    type Matched = FileMatch;

    fn name(&self) -> &str {
        &self.settings.name
    }

    fn enabled(&self) -> bool {
        self.settings.enabled
    }

    fn priority(&self) -> i32 {
        self.settings.priority
    }

    async fn matches(&self, ctx: &RequestContext) -> Result<Option<FileMatch>, BoxError> {
        if ctx.path() != self.path {
            return Ok(None);
        }
        match ctx.query_param(&self.param) {
            Some(action) => locate_file(&self.dir, action).await,
            None => Ok(None),
        }
    }

    async fn respond(
        &self,
        _ctx: &RequestContext,
        matched: FileMatch,
        _previous: Option<&ResponseOutcome>,
        _handled: &[ModuleRef],
    ) -> Result<Option<ResponseOutcome>, BoxError> {
        file_response(&matched, &self.content_types).await.map(Some)
    }
}
