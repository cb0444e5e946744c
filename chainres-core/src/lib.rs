//! # chainres-core
//!
//! Core types for the chainres response-composition dispatcher.
//!
//! This crate has minimal dependencies and is what module authors build
//! against. The loader and the sample modules live in `chainres-std`, the
//! dispatcher itself in `chainres`.
//!
//! # Vocabulary
//!
//! - [`RequestContext`]: the immutable, per-request view every module sees.
//! - [`ChainModule`]: the capability contract (`matches` + `respond`).
//! - [`ResponseOutcome`]: the value each module hands to the next one.
//! - [`ChainState`]: the accumulator threaded through the compose phase.
//!
//! # Error Types
//!
//! - [`BoxError`] - what module capabilities return
//! - [`ChainError`] - where in the chain something failed

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod context;
mod error;
mod module;
mod response;
mod state;

// Re-exports
pub use context::{REQUESTED_WITH, RequestContext};
pub use error::{BoxError, ChainError};
pub use module::{
    BoxFuture, ChainModule, DEFAULT_PRIORITY, DynChainModule, MatchPayload, ModuleRef,
    module_names,
};
pub use response::{Content, Headers, ResponseOutcome};
pub use state::{ChainState, Matched};
