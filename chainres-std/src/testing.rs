//! Testing utilities for chainres.
//!
//! This module provides modules whose behavior is scripted up front, so
//! dispatcher tests can focus on ordering, failure isolation and composition
//! instead of on module logic.
//!
//! # Features
//!
//! - [`ScriptedModule`]: a module that matches and responds as told
//! - [`CallLog`]: a shared, ordered record of every capability call

use chainres_core::{
    BoxError, ChainModule, DEFAULT_PRIORITY, ModuleRef, RequestContext, ResponseOutcome,
};
use std::sync::{Arc, Mutex};

// ============================================================================
// Call Log
// ============================================================================

/// Ordered record of `match:<name>` and `respond:<name>` calls.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: String) {
        self.entries.lock().unwrap().push(entry);
    }

    /// A copy of every entry so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Names of the modules whose `respond` ran, in order.
    pub fn responders(&self) -> Vec<String> {
        self.with_prefix("respond:")
    }

    /// Names of the modules whose `matches` ran, in order.
    pub fn probes(&self) -> Vec<String> {
        self.with_prefix("match:")
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter_map(|entry| entry.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

// ============================================================================
// Scripted Module
// ============================================================================

/// What a [`ScriptedModule`] answers to `matches`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMatch {
    /// Take part.
    Match,
    /// Stay out.
    Skip,
    /// Return an error.
    Fail,
    /// Panic.
    Panic,
}

/// What a [`ScriptedModule`] answers to `respond`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnRespond {
    /// Return this response.
    Reply(ResponseOutcome),
    /// Return the previous response unchanged.
    PassThrough,
    /// Append text to the previous content (or start from empty).
    Append(String),
    /// Return no response.
    Nothing,
    /// Return an error.
    Fail,
    /// Panic.
    Panic,
}

/// A module that matches and responds as scripted, recording every call.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::new();
/// let module = ScriptedModule::new("a")
///     .priority(10)
///     .reply(ResponseOutcome::with_content("a"))
///     .log(&log);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedModule {
    name: String,
    enabled: bool,
    priority: i32,
    on_match: OnMatch,
    on_respond: OnRespond,
    log: CallLog,
}

impl ScriptedModule {
    /// A module that matches everything and passes the previous response through.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            priority: DEFAULT_PRIORITY,
            on_match: OnMatch::Match,
            on_respond: OnRespond::PassThrough,
            log: CallLog::new(),
        }
    }

    /// Set priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set enabled state.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Script the match phase.
    pub fn on_match(mut self, on_match: OnMatch) -> Self {
        self.on_match = on_match;
        self
    }

    /// Script the respond phase.
    pub fn on_respond(mut self, on_respond: OnRespond) -> Self {
        self.on_respond = on_respond;
        self
    }

    /// Shorthand for `on_respond(OnRespond::Reply(response))`.
    pub fn reply(self, response: ResponseOutcome) -> Self {
        self.on_respond(OnRespond::Reply(response))
    }

    /// Record calls into a shared log.
    pub fn log(mut self, log: &CallLog) -> Self {
        self.log = log.clone();
        self
    }

    /// Type-erase into a [`ModuleRef`].
    pub fn into_ref(self) -> ModuleRef {
        Arc::new(self)
    }
}

impl ChainModule for ScriptedModule {
    type Matched = ();

    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn matches(&self, _ctx: &RequestContext) -> Result<Option<()>, BoxError> {
        self.log.push(format!("match:{}", self.name));
        match self.on_match {
            OnMatch::Match => Ok(Some(())),
            OnMatch::Skip => Ok(None),
            OnMatch::Fail => Err(format!("{} refused to match", self.name).into()),
            OnMatch::Panic => panic!("{} panicked while matching", self.name),
        }
    }

    async fn respond(
        &self,
        _ctx: &RequestContext,
        _matched: (),
        previous: Option<&ResponseOutcome>,
        _handled: &[ModuleRef],
    ) -> Result<Option<ResponseOutcome>, BoxError> {
        self.log.push(format!("respond:{}", self.name));
        match &self.on_respond {
            OnRespond::Reply(response) => Ok(Some(response.clone())),
            OnRespond::PassThrough => Ok(previous.cloned()),
            OnRespond::Append(suffix) => {
                let mut response = previous.cloned().unwrap_or_default();
                let mut text = response
                    .content
                    .as_ref()
                    .map(|c| c.to_text().into_owned())
                    .unwrap_or_default();
                text.push_str(suffix);
                response.content = Some(text.into());
                Ok(Some(response))
            }
            OnRespond::Nothing => Ok(None),
            OnRespond::Fail => Err(format!("{} failed to respond", self.name).into()),
            OnRespond::Panic => panic!("{} panicked while responding", self.name),
        }
    }
}
