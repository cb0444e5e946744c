//! Per-request values exchanged between the match and compose phases.

use crate::{
    module::{MatchPayload, ModuleRef, module_names},
    response::ResponseOutcome,
};
use std::fmt;

/// A module that accepted the request, with the payload it produced.
pub struct Matched {
    /// The matching module.
    pub module: ModuleRef,
    /// The payload returned by `matches`, forwarded to `respond` untouched.
    pub match_result: MatchPayload,
    /// The module's priority at match time.
    pub priority: i32,
}

impl fmt::Debug for Matched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matched")
            .field("module", &self.module.name())
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// The accumulator of the compose phase.
///
/// Starts empty for every request; only the fold writes to it.
#[derive(Default, Clone)]
pub struct ChainState {
    /// The response produced by the last module that succeeded.
    pub previous_response: Option<ResponseOutcome>,
    /// Every module that was given a turn, in order, failures included.
    pub handled_modules: Vec<ModuleRef>,
}

impl ChainState {
    /// The initial, empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the handled modules, in order.
    pub fn handled_names(&self) -> Vec<&str> {
        module_names(&self.handled_modules)
    }
}

impl fmt::Debug for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainState")
            .field("previous_response", &self.previous_response)
            .field("handled_modules", &self.handled_names())
            .finish()
    }
}
