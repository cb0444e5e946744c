//! Serve request paths from a directory of mock files.
//!
//! The request path has every `/` replaced by `_`, so `/scripts/app.js` is
//! served from a file named `_scripts_app.js` (or `_scripts_app` followed by
//! any extension) anywhere under the directory.

use super::{
    ModuleSettings, ModuleSpec,
    files::{ContentTypes, FileMatch, file_response, locate_file},
};
use chainres_core::{BoxError, ChainModule, ModuleRef, RequestContext, ResponseOutcome};
use serde::Deserialize;
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Arc,
};

/// Descriptor kind name.
pub const KIND: &str = "local-file-map";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Options {
    dir: PathBuf,
    #[serde(default)]
    content_types: HashMap<String, String>,
}

/// Maps request paths to files under a directory.
#[derive(Debug, Clone)]
pub struct LocalFileMap {
    settings: ModuleSettings,
    dir: PathBuf,
    content_types: ContentTypes,
}

impl LocalFileMap {
    /// Serve files from `dir`.
    pub fn new(settings: ModuleSettings, dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            dir: dir.into(),
            content_types: ContentTypes::default(),
        }
    }

    /// Map an extension to a content type.
    pub fn with_content_type(mut self, extension: &str, content_type: &str) -> Self {
        self.content_types.insert(extension, content_type);
        self
    }

    /// File name looked up for a request path.
    pub fn file_name_for(path: &str) -> String {
        path.replace('/', "_")
    }

    pub(crate) fn from_spec(spec: &ModuleSpec) -> Result<ModuleRef, BoxError> {
        let options: Options = spec.options()?;
        Ok(Arc::new(Self {
            settings: spec.settings.clone(),
            dir: spec.resolve(&options.dir),
            content_types: ContentTypes::with_overrides(&options.content_types),
        }))
    }
}

impl ChainModule for LocalFileMap {
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
        locate_file(&self.dir, &Self::file_name_for(ctx.path())).await
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
