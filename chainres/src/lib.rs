//! # chainres - Response Composition for HTTP Hosts
//!
//! `chainres` runs a set of pluggable response modules against each request.
//! Every module is asked whether it wants the request; those that match are
//! chained, highest priority first, each one seeing the response built so
//! far. The final response is written to the host, or the request is handed
//! on to the next handler.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chainres::prelude::*;
//!
//! let dispatcher = Dispatcher::from_sources(
//!     [ModuleSource::path("./modules")],
//!     ChainConfig::new().with_debug(true),
//! );
//!
//! let ctx = RequestContext::from_request(request);
//! match dispatcher.dispatch(&ctx).await {
//!     Dispatch { body: Some(body), .. } => { /* write body */ }
//!     _ => { /* next handler */ }
//! }
//! ```
//!
//! With the `tower` feature, [`tower::ChainResponseLayer`] does the same in
//! front of any `http` service.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod compose;
pub mod config;
pub mod dispatcher;
pub mod evaluate;
pub mod host;
pub mod switch;

#[cfg(feature = "tower")]
pub mod tower;

pub use chainres_core::{
    BoxError, ChainError, ChainModule, ChainState, Content, DEFAULT_PRIORITY, DynChainModule,
    Headers, MatchPayload, Matched, ModuleRef, REQUESTED_WITH, RequestContext, ResponseOutcome,
    module_names,
};
pub use chainres_std::{
    Candidate, FileFilter, LoadError, LoadReport, Loader, MODULE_EXTENSION, ModuleFactory,
    ModuleKinds, ModuleSettings, ModuleSource, ModuleSpec, Rejection, Validation,
    ValidationError, validate,
};

pub use compose::compose;
pub use config::{ChainConfig, ConfigError, DEFAULT_SWITCH_PATH};
pub use dispatcher::Dispatcher;
pub use evaluate::evaluate;
pub use host::{Dispatch, Host, RecordingHost};
pub use switch::SwitchHandle;

/// Built-in module kinds.
pub mod modules {
    pub use chainres_std::modules::{
        ContentTypes, FileMatch, Jsonp, LocalFileMap, StaticContent, UrlQueryMap,
    };
}

/// Testing utilities.
pub mod testing {
    pub use chainres_std::testing::{CallLog, OnMatch, OnRespond, ScriptedModule};
}

/// Common imports.
///
/// ```rust,ignore
/// use chainres::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, ChainConfig, ChainModule, Content, Dispatch, Dispatcher, Host, ModuleSource,
        RequestContext, ResponseOutcome,
    };
}
