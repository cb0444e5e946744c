//! The request entry point.

use crate::{
    compose::compose,
    config::ChainConfig,
    evaluate::evaluate,
    host::{Dispatch, Host},
    switch::SwitchHandle,
};
use chainres_core::{ModuleRef, RequestContext, module_names};
use chainres_std::{LoadReport, Loader, ModuleSource};
use std::{fmt, sync::Arc};

/// Runs the loaded modules against requests.
///
/// Cheap to clone; clones share the module set and the on/off switch.
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = Dispatcher::from_sources(
///     [ModuleSource::path("./modules")],
///     ChainConfig::new().with_debug(true),
/// );
///
/// let ctx = RequestContext::from_request(request);
/// let mut host = RecordingHost::new();
/// dispatcher.serve(&ctx, &mut host).await;
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    modules: Arc<[ModuleRef]>,
    config: Arc<ChainConfig>,
    switch: SwitchHandle,
}

impl Dispatcher {
    /// Dispatch over `modules`. Disabled modules are dropped here and never
    /// probed.
    pub fn new(modules: impl IntoIterator<Item = ModuleRef>, config: ChainConfig) -> Self {
        let modules: Arc<[ModuleRef]> = modules
            .into_iter()
            .filter(|module| module.enabled())
            .collect();
        let switch = SwitchHandle::new(config.switch_on);
        Self {
            modules,
            config: Arc::new(config),
            switch,
        }
    }

    /// Load `sources` with the built-in module kinds and dispatch over the
    /// result.
    pub fn from_sources<I>(sources: I, config: ChainConfig) -> Self
    where
        I: IntoIterator<Item = ModuleSource>,
    {
        let loader = Loader::new().with_debug(config.debug);
        let modules = loader.load(sources).into_modules();
        Self::new(modules, config)
    }

    /// Load `sources` with `loader`, also returning the load report.
    pub fn with_loader<I>(loader: &Loader, sources: I, config: ChainConfig) -> (Self, LoadReport)
    where
        I: IntoIterator<Item = ModuleSource>,
    {
        let mut report = loader.load(sources);
        let modules = std::mem::take(&mut report.modules);
        (Self::new(modules, config), report)
    }

    /// The enabled modules, in load order.
    pub fn modules(&self) -> &[ModuleRef] {
        &self.modules
    }

    /// The configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Whether the dispatcher is switched on.
    pub fn is_enabled(&self) -> bool {
        self.switch.is_on()
    }

    /// Flip the switch, returning the new state.
    pub fn toggle(&self) -> bool {
        self.switch.toggle()
    }

    /// The switch shared by this dispatcher and its clones.
    pub fn switch(&self) -> &SwitchHandle {
        &self.switch
    }

    /// Work out what `ctx` does to the host.
    pub async fn dispatch(&self, ctx: &RequestContext) -> Dispatch {
        let debug = self.config.debug;
        let method = ctx.method().as_str();
        let path = ctx.path();

        if path == self.config.switch_path {
            let on = self.toggle();
            if debug {
                tracing::debug!(method, path, on, "switch toggled");
            }
            return Dispatch::toggled(on);
        }

        if !self.switch.is_on() {
            if debug {
                tracing::debug!(method, path, "switched off, deferring");
            }
            return Dispatch::deferred();
        }

        let matched = evaluate(&self.modules, ctx, debug).await;
        if debug {
            if matched.is_empty() {
                tracing::debug!(method, path, "no module matched");
            } else {
                let names: Vec<&str> = matched.iter().map(|m| m.module.name()).collect();
                tracing::debug!(method, path, modules = ?names, "modules matched");
            }
        }

        let state = compose(ctx, matched, debug).await;
        let dispatch = Dispatch::from_state(state);
        if debug {
            tracing::debug!(
                method,
                path,
                handled = dispatch.is_handled(),
                defer = dispatch.defer,
                "dispatch finished"
            );
        }
        dispatch
    }

    /// Dispatch `ctx` and apply the outcome to `host`.
    pub async fn serve<H: Host + ?Sized>(&self, ctx: &RequestContext, host: &mut H) {
        self.dispatch(ctx).await.apply(host);
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("modules", &module_names(&self.modules))
            .field("config", &self.config)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainres_std::testing::{CallLog, ScriptedModule};
    use http::Request;

    fn ctx(uri: &str) -> RequestContext {
        RequestContext::from_request(Request::get(uri).body(()).unwrap())
    }

    #[test]
    fn new_drops_disabled_modules() {
        let dispatcher = Dispatcher::new(
            [
                ScriptedModule::new("on").into_ref(),
                ScriptedModule::new("off").enabled(false).into_ref(),
            ],
            ChainConfig::new(),
        );
        assert_eq!(module_names(dispatcher.modules()), vec!["on"]);
    }

    #[tokio::test]
    async fn switched_off_dispatcher_does_no_work() {
        let log = CallLog::new();
        let dispatcher = Dispatcher::new(
            [ScriptedModule::new("a").log(&log).into_ref()],
            ChainConfig::new().with_switch_on(false),
        );

        assert_eq!(dispatcher.dispatch(&ctx("/any")).await, Dispatch::deferred());
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn custom_switch_path() {
        let dispatcher = Dispatcher::new(Vec::new(), ChainConfig::new().with_switch_path("/off"));
        let clone = dispatcher.clone();

        assert_eq!(dispatcher.dispatch(&ctx("/off")).await, Dispatch::toggled(false));
        assert!(!clone.is_enabled());
        assert_eq!(
            dispatcher.dispatch(&ctx(crate::DEFAULT_SWITCH_PATH)).await,
            Dispatch::deferred()
        );
    }
}
