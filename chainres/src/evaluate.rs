//! # Match Phase
//!
//! Every module is probed concurrently. The phase waits until each probe has
//! settled and never short-circuits: a probe that errors, panics or declines
//! only removes its own module from the chain.

use chainres_core::{ChainError, Matched, ModuleRef, RequestContext};
use futures::{FutureExt, future::join_all};
use std::{panic::AssertUnwindSafe, sync::Arc};

/// Probe `modules` against the request and return the matches, highest
/// priority first.
///
/// Equal priorities keep the order of `modules`. Probe failures are logged
/// when `debug` is set and otherwise swallowed.
pub async fn evaluate(modules: &[ModuleRef], ctx: &RequestContext, debug: bool) -> Vec<Matched> {
    let probes = modules.iter().map(|module| async move {
        let check = async move { module.matches_dyn(ctx).await };
        let settled = AssertUnwindSafe(check).catch_unwind().await;
        let outcome = match settled {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(source)) => Err(ChainError::Probe {
                module: module.name().to_string(),
                source,
            }),
            Err(panic) => Err(ChainError::from_panic(module.name(), panic.as_ref())),
        };
        (module, outcome)
    });

    let mut matched = Vec::new();
    for (module, outcome) in join_all(probes).await {
        match outcome {
            Ok(Some(match_result)) => matched.push(Matched {
                module: Arc::clone(module),
                match_result,
                priority: module.priority(),
            }),
            Ok(None) => {
                if debug {
                    tracing::trace!(module = module.name(), "module does not match");
                }
            }
            Err(error) => {
                if debug {
                    tracing::warn!(module = module.name(), error = %error, "match probe failed");
                }
            }
        }
    }

    // `sort_by` is stable: ties keep discovery order.
    matched.sort_by(|a, b| b.priority.cmp(&a.priority));
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainres_std::testing::{CallLog, OnMatch, ScriptedModule};
    use http::Request;

    fn ctx() -> RequestContext {
        RequestContext::from_request(Request::get("/").body(()).unwrap())
    }

    fn names(matched: &[Matched]) -> Vec<&str> {
        matched.iter().map(|m| m.module.name()).collect()
    }

    #[tokio::test]
    async fn failures_do_not_affect_other_probes() {
        let log = CallLog::new();
        let modules = vec![
            ScriptedModule::new("fails").on_match(OnMatch::Fail).log(&log).into_ref(),
            ScriptedModule::new("panics").on_match(OnMatch::Panic).log(&log).into_ref(),
            ScriptedModule::new("skips").on_match(OnMatch::Skip).log(&log).into_ref(),
            ScriptedModule::new("matches").log(&log).into_ref(),
        ];

        let matched = evaluate(&modules, &ctx(), true).await;
        assert_eq!(names(&matched), vec!["matches"]);
        assert_eq!(log.probes().len(), 4);
    }

    #[tokio::test]
    async fn sorts_by_descending_priority_stably() {
        let modules = vec![
            ScriptedModule::new("five-a").priority(5).into_ref(),
            ScriptedModule::new("ten").priority(10).into_ref(),
            ScriptedModule::new("five-b").priority(5).into_ref(),
            ScriptedModule::new("negative").priority(-1).into_ref(),
        ];

        let matched = evaluate(&modules, &ctx(), false).await;
        assert_eq!(names(&matched), vec!["ten", "five-a", "five-b", "negative"]);
        assert_eq!(matched[0].priority, 10);
    }

    #[tokio::test]
    async fn no_modules_means_no_matches() {
        assert!(evaluate(&[], &ctx(), false).await.is_empty());
    }
}
