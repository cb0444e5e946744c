//! # Compose Phase
//!
//! A left-to-right fold of the matched modules' `respond` steps over a
//! [`ChainState`]. Exactly one step is in flight at a time.
//!
//! Two failure modes:
//!
//! - a step that returns an error costs only its own contribution: the
//!   previous response is kept and the module is still recorded as handled;
//! - a step that panics abandons the whole composition, and the request ends
//!   with an empty state.

use chainres_core::{ChainError, ChainState, Matched, RequestContext};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Fold `matched`, in order, into the final chain state.
pub async fn compose(ctx: &RequestContext, matched: Vec<Matched>, debug: bool) -> ChainState {
    let mut state = ChainState::new();
    if debug && !matched.is_empty() {
        let names: Vec<&str> = matched.iter().map(|m| m.module.name()).collect();
        tracing::debug!(count = matched.len(), modules = ?names, "composing modules");
    }

    for Matched {
        module,
        match_result,
        ..
    } in matched
    {
        if debug {
            tracing::debug!(module = module.name(), "calling respond");
        }
        let responder = &module;
        let previous = state.previous_response.as_ref();
        let handled = state.handled_modules.as_slice();
        // Guard the call too: a module may panic before returning its future.
        let step = async move {
            responder
                .respond_dyn(ctx, match_result, previous, handled)
                .await
        };
        let settled = AssertUnwindSafe(step).catch_unwind().await;

        match settled {
            Ok(Ok(response)) => {
                if debug {
                    tracing::debug!(module = module.name(), "respond finished");
                }
                state.previous_response = response;
            }
            Ok(Err(source)) => {
                let error = ChainError::Respond {
                    module: module.name().to_string(),
                    source,
                };
                tracing::error!(module = module.name(), error = %error, "respond failed, keeping previous response");
            }
            Err(panic) => {
                let error = ChainError::from_panic(module.name(), panic.as_ref());
                tracing::error!(module = module.name(), error = %error, "composition abandoned");
                return ChainState::new();
            }
        }
        state.handled_modules.push(module);
    }
    state
}
