#![allow(dead_code)]

use chainres::{
    BoxError, ChainModule, DynChainModule, MatchPayload, ModuleRef, RequestContext,
    ResponseOutcome, module_names,
};
use futures::future::BoxFuture;
use http::Request;
use std::{
    path::Path,
    sync::{Arc, Mutex, Once},
};
use tokio::sync::Barrier;

// ============================================================================
// Setup
// ============================================================================

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn get(uri: &str) -> RequestContext {
    RequestContext::from_request(Request::get(uri).body(()).unwrap())
}

pub fn post(uri: &str) -> RequestContext {
    RequestContext::from_request(Request::post(uri).body(()).unwrap())
}

pub fn write(dir: &Path, relative: &str, source: &str) {
    let path = dir.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, source).unwrap();
}

// ============================================================================
// Test Modules
// ============================================================================

/// Only matches once every module sharing the barrier is probing.
pub struct BarrierModule {
    pub name: String,
    pub barrier: Arc<Barrier>,
}

impl BarrierModule {
    pub fn new(name: &str, barrier: &Arc<Barrier>) -> ModuleRef {
        Arc::new(Self {
            name: name.to_string(),
            barrier: Arc::clone(barrier),
        })
    }
}

impl ChainModule for BarrierModule {
    type Matched = ();

    fn name(&self) -> &str {
        &self.name
    }

    async fn matches(&self, _ctx: &RequestContext) -> Result<Option<()>, BoxError> {
        self.barrier.wait().await;
        Ok(Some(()))
    }

    async fn respond(
        &self,
        _ctx: &RequestContext,
        _matched: (),
        previous: Option<&ResponseOutcome>,
        _handled: &[ModuleRef],
    ) -> Result<Option<ResponseOutcome>, BoxError> {
        Ok(previous.cloned())
    }
}

/// Records the handled history it sees and the query value it matched on.
pub struct HistoryModule {
    pub name: String,
    pub priority: i32,
    pub seen: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl HistoryModule {
    pub fn new(name: &str, priority: i32, seen: &Arc<Mutex<Vec<(String, Vec<String>)>>>) -> ModuleRef {
        Arc::new(Self {
            name: name.to_string(),
            priority,
            seen: Arc::clone(seen),
        })
    }
}

impl ChainModule for HistoryModule {
    type Matched = String;

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn matches(&self, ctx: &RequestContext) -> Result<Option<String>, BoxError> {
        Ok(Some(ctx.query_param("tag").unwrap_or("none").to_string()))
    }

    async fn respond(
        &self,
        _ctx: &RequestContext,
        matched: String,
        previous: Option<&ResponseOutcome>,
        handled: &[ModuleRef],
    ) -> Result<Option<ResponseOutcome>, BoxError> {
        let names = module_names(handled).into_iter().map(String::from).collect();
        self.seen.lock().unwrap().push((format!("{}:{matched}", self.name), names));
        Ok(previous.cloned())
    }
}

/// Implements the object-safe trait by hand and panics while building its
/// futures, before any of them is polled.
pub struct EagerPanicModule {
    pub name: String,
    pub priority: i32,
    pub in_matches: bool,
}

impl EagerPanicModule {
    pub fn in_matches(name: &str) -> ModuleRef {
        Arc::new(Self {
            name: name.to_string(),
            priority: 100,
            in_matches: true,
        })
    }

    pub fn in_respond(name: &str, priority: i32) -> ModuleRef {
        Arc::new(Self {
            name: name.to_string(),
            priority,
            in_matches: false,
        })
    }
}

impl DynChainModule for EagerPanicModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        true
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn matches_dyn<'a>(
        &'a self,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Option<MatchPayload>, BoxError>> {
        if self.in_matches {
            panic!("{} panicked before matching", self.name);
        }
        Box::pin(async { Ok(Some(Box::new(()) as MatchPayload)) })
    }

    fn respond_dyn<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        _matched: MatchPayload,
        _previous: Option<&'a ResponseOutcome>,
        _handled: &'a [ModuleRef],
    ) -> BoxFuture<'a, Result<Option<ResponseOutcome>, BoxError>> {
        panic!("{} panicked before responding", self.name);
    }
}
