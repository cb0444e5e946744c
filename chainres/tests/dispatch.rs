//! Dispatcher behaviour end to end: match, compose and host effects.

mod common;

use chainres::{
    ChainConfig, Content, DEFAULT_SWITCH_PATH, Dispatch, Dispatcher, RecordingHost,
    ResponseOutcome,
    testing::{CallLog, OnMatch, OnRespond, ScriptedModule},
};
use common::{BarrierModule, EagerPanicModule, HistoryModule, get, init_tracing, post};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::Barrier;

fn debug_config() -> ChainConfig {
    ChainConfig::new().with_debug(true)
}

#[tokio::test]
async fn disabled_module_is_never_matched() {
    init_tracing();
    let log = CallLog::new();
    let dispatcher = Dispatcher::new(
        [
            ScriptedModule::new("off").enabled(false).log(&log).into_ref(),
            ScriptedModule::new("on").log(&log).into_ref(),
        ],
        debug_config(),
    );

    dispatcher.dispatch(&get("/")).await;
    assert_eq!(log.entries(), vec!["match:on", "respond:on"]);
}

#[tokio::test]
async fn responds_by_descending_priority() {
    init_tracing();
    let log = CallLog::new();
    let dispatcher = Dispatcher::new(
        [
            ScriptedModule::new("first-five").priority(5).log(&log).into_ref(),
            ScriptedModule::new("ten").priority(10).log(&log).into_ref(),
            ScriptedModule::new("second-five").priority(5).log(&log).into_ref(),
        ],
        debug_config(),
    );

    dispatcher.dispatch(&get("/")).await;
    assert_eq!(log.responders(), vec!["ten", "first-five", "second-five"]);
}

#[tokio::test]
async fn failing_respond_keeps_previous_response() {
    init_tracing();
    let dispatcher = Dispatcher::new(
        [
            ScriptedModule::new("a")
                .priority(3)
                .reply(ResponseOutcome::with_content("a"))
                .into_ref(),
            ScriptedModule::new("b").priority(2).on_respond(OnRespond::Fail).into_ref(),
            ScriptedModule::new("c").priority(1).into_ref(),
        ],
        debug_config(),
    );

    let mut host = RecordingHost::new();
    dispatcher.serve(&get("/"), &mut host).await;
    assert_eq!(host.body_text().as_deref(), Some("a"));
    assert_eq!(host.deferred, 0);
}

#[tokio::test]
async fn panicking_respond_defers_the_request() {
    init_tracing();
    let dispatcher = Dispatcher::new(
        [
            ScriptedModule::new("a")
                .priority(2)
                .reply(ResponseOutcome::with_content("a"))
                .into_ref(),
            ScriptedModule::new("b").priority(1).on_respond(OnRespond::Panic).into_ref(),
        ],
        debug_config(),
    );

    assert_eq!(dispatcher.dispatch(&get("/")).await, Dispatch::deferred());
}

#[tokio::test]
async fn match_failures_only_exclude_their_module() {
    init_tracing();
    let dispatcher = Dispatcher::new(
        [
            ScriptedModule::new("fails").on_match(OnMatch::Fail).into_ref(),
            ScriptedModule::new("panics").on_match(OnMatch::Panic).into_ref(),
            ScriptedModule::new("ok")
                .reply(ResponseOutcome::with_content("ok"))
                .into_ref(),
        ],
        debug_config(),
    );

    let dispatch = dispatcher.dispatch(&get("/")).await;
    assert_eq!(dispatch.body, Some(Content::Text("ok".into())));
}

#[tokio::test]
async fn respond_panicking_before_its_future_defers() {
    init_tracing();
    let dispatcher = Dispatcher::new(
        [
            ScriptedModule::new("a")
                .priority(2)
                .reply(ResponseOutcome::with_content("a"))
                .into_ref(),
            EagerPanicModule::in_respond("eager", 1),
        ],
        debug_config(),
    );

    assert_eq!(dispatcher.dispatch(&get("/")).await, Dispatch::deferred());
}

#[tokio::test]
async fn matches_panicking_before_its_future_excludes_only_itself() {
    init_tracing();
    let dispatcher = Dispatcher::new(
        [
            EagerPanicModule::in_matches("eager"),
            ScriptedModule::new("ok")
                .reply(ResponseOutcome::with_content("ok"))
                .into_ref(),
        ],
        debug_config(),
    );

    let dispatch = dispatcher.dispatch(&get("/")).await;
    assert_eq!(dispatch.body, Some(Content::Text("ok".into())));
}

#[tokio::test]
async fn no_match_defers() {
    init_tracing();
    let log = CallLog::new();
    let dispatcher = Dispatcher::new(
        [ScriptedModule::new("skip").on_match(OnMatch::Skip).log(&log).into_ref()],
        debug_config(),
    );

    let mut host = RecordingHost::new();
    dispatcher.serve(&get("/"), &mut host).await;
    assert!(host.sent.is_empty());
    assert!(host.headers.is_empty());
    assert_eq!(host.deferred, 1);
    assert!(log.responders().is_empty());
}

#[tokio::test]
async fn contentless_response_emits_no_headers() {
    init_tracing();
    let dispatcher = Dispatcher::new(
        [ScriptedModule::new("headers-only")
            .reply(ResponseOutcome::new().header("X-Chain", "1"))
            .into_ref()],
        debug_config(),
    );

    let mut host = RecordingHost::new();
    dispatcher.serve(&get("/"), &mut host).await;
    assert!(host.headers.is_empty());
    assert!(host.sent.is_empty());
    assert_eq!(host.deferred, 1);
}

#[tokio::test]
async fn continue_next_sends_and_defers() {
    init_tracing();
    let dispatcher = Dispatcher::new(
        [ScriptedModule::new("x")
            .reply(
                ResponseOutcome::with_content("x")
                    .header("X-Chain", "x")
                    .continue_next(true),
            )
            .into_ref()],
        debug_config(),
    );

    let mut host = RecordingHost::new();
    dispatcher.serve(&get("/"), &mut host).await;
    assert_eq!(host.body_text().as_deref(), Some("x"));
    assert_eq!(host.header_values("x-chain"), vec!["x"]);
    assert_eq!(host.deferred, 1);
}

#[tokio::test]
async fn switch_path_toggles_without_touching_modules() {
    init_tracing();
    let log = CallLog::new();
    let dispatcher = Dispatcher::new(
        [ScriptedModule::new("a")
            .reply(ResponseOutcome::with_content("a"))
            .log(&log)
            .into_ref()],
        debug_config(),
    );
    let clone = dispatcher.clone();

    let mut host = RecordingHost::new();
    dispatcher.serve(&post(DEFAULT_SWITCH_PATH), &mut host).await;
    assert_eq!(host.body_text().as_deref(), Some("current switch is false"));
    assert_eq!(host.deferred, 0);
    assert!(!clone.is_enabled());

    // Switched off: every request defers.
    assert_eq!(clone.dispatch(&get("/a")).await, Dispatch::deferred());

    let mut host = RecordingHost::new();
    clone.serve(&get(DEFAULT_SWITCH_PATH), &mut host).await;
    assert_eq!(host.body_text().as_deref(), Some("current switch is true"));
    assert!(dispatcher.is_enabled());

    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn matches_run_concurrently() {
    init_tracing();
    let barrier = Arc::new(Barrier::new(2));
    let dispatcher = Dispatcher::new(
        [
            BarrierModule::new("left", &barrier),
            BarrierModule::new("right", &barrier),
        ],
        debug_config(),
    );

    // Sequential matching would wait on the barrier forever.
    let dispatch = tokio::time::timeout(Duration::from_secs(5), dispatcher.dispatch(&get("/")))
        .await
        .expect("matches did not run concurrently");
    assert_eq!(dispatch, Dispatch::deferred());
}

#[tokio::test]
async fn respond_sees_its_payload_and_handled_history() {
    init_tracing();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Dispatcher::new(
        [
            HistoryModule::new("low", 1, &seen),
            ScriptedModule::new("failing")
                .priority(2)
                .on_respond(OnRespond::Fail)
                .into_ref(),
            HistoryModule::new("high", 3, &seen),
        ],
        debug_config(),
    );

    dispatcher.dispatch(&get("/page?tag=t1")).await;
    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            ("high:t1".to_string(), Vec::<String>::new()),
            (
                "low:t1".to_string(),
                vec!["high".to_string(), "failing".to_string()]
            ),
        ]
    );
}

#[tokio::test]
async fn requests_do_not_share_chain_state() {
    init_tracing();
    let dispatcher = Dispatcher::new(
        [ScriptedModule::new("append")
            .on_respond(OnRespond::Append("+".into()))
            .into_ref()],
        debug_config(),
    );

    for _ in 0..3 {
        let dispatch = dispatcher.dispatch(&get("/")).await;
        assert_eq!(dispatch.body, Some(Content::Text("+".into())));
    }
}
