//! # Response Modules
//!
//! A module is an independently authored unit of request handling. It is
//! asked two questions per request:
//!
//! 1. [`matches`](ChainModule::matches): does this request concern me? A
//!    module answers with `Some(payload)` to take part, `None` to stay out, or
//!    an error, which the dispatcher treats as `None`.
//! 2. [`respond`](ChainModule::respond): given my payload and whatever the
//!    modules before me produced, what should the response be now?
//!
//! The match phase runs every module concurrently; the respond phase runs the
//! matching modules one after the other, highest [`priority`] first.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`ChainModule`] uses native `async fn` and a typed match payload. The
//! dispatcher stores modules as [`ModuleRef`], an `Arc<dyn DynChainModule>`;
//! every `ChainModule` is a [`DynChainModule`] through a blanket impl that
//! boxes the payload on the way out and downcasts it on the way back in.
//!
//! [`priority`]: ChainModule::priority

use crate::{
    context::RequestContext,
    error::{BoxError, ChainError},
    response::ResponseOutcome,
};
use std::{any::Any, future::Future, pin::Pin, sync::Arc};

/// Priority a module gets when it does not choose one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased match payload, handed back verbatim to the module that made it.
pub type MatchPayload = Box<dyn Any + Send + Sync>;

/// The canonical loaded module record.
pub type ModuleRef = Arc<dyn DynChainModule>;

/// The capability contract every response module implements.
///
/// # Example
///
/// ```rust,ignore
/// struct Hello;
///
/// impl ChainModule for Hello {
///     type Matched = ();
///
///     fn name(&self) -> &str {
///         "hello"
///     }
///
///     async fn matches(&self, ctx: &RequestContext) -> Result<Option<()>, BoxError> {
///         Ok((ctx.path() == "/hello").then_some(()))
///     }
///
///     async fn respond(
///         &self,
///         _ctx: &RequestContext,
///         _matched: (),
///         _previous: Option<&ResponseOutcome>,
///         _handled: &[ModuleRef],
///     ) -> Result<Option<ResponseOutcome>, BoxError> {
///         Ok(Some(ResponseOutcome::with_content("hello")))
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `ChainModule`",
    label = "missing `ChainModule` implementation",
    note = "Modules must implement `name`, `matches` and `respond`."
)]
pub trait ChainModule: Send + Sync + 'static {
    /// Whatever `matches` wants to hand over to `respond`.
    type Matched: Send + Sync + 'static;

    /// Name used in logs and in the handled-module history. Must not be empty.
    fn name(&self) -> &str;

    /// Disabled modules are dropped at load time and never evaluated.
    fn enabled(&self) -> bool {
        true
    }

    /// Higher priorities respond earlier.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Decide whether this module applies to the request.
    fn matches(
        &self,
        ctx: &RequestContext,
    ) -> impl Future<Output = Result<Option<Self::Matched>, BoxError>> + Send;

    /// Produce the next response in the chain.
    ///
    /// `previous` is what the preceding module produced (`None` for the first
    /// one); return it cloned to pass it through unchanged. `handled` lists
    /// the modules that already ran for this request, failed ones included.
    fn respond(
        &self,
        ctx: &RequestContext,
        matched: Self::Matched,
        previous: Option<&ResponseOutcome>,
        handled: &[ModuleRef],
    ) -> impl Future<Output = Result<Option<ResponseOutcome>, BoxError>> + Send;
}

/// Object-safe version of [`ChainModule`].
pub trait DynChainModule: Send + Sync + 'static {
    /// See [`ChainModule::name`].
    fn name(&self) -> &str;

    /// See [`ChainModule::enabled`].
    fn enabled(&self) -> bool;

    /// See [`ChainModule::priority`].
    fn priority(&self) -> i32;

    /// See [`ChainModule::matches`].
    fn matches_dyn<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Option<MatchPayload>, BoxError>>;

    /// See [`ChainModule::respond`].
    fn respond_dyn<'a>(
        &'a self,
        ctx: &'a RequestContext,
        matched: MatchPayload,
        previous: Option<&'a ResponseOutcome>,
        handled: &'a [ModuleRef],
    ) -> BoxFuture<'a, Result<Option<ResponseOutcome>, BoxError>>;
}

impl<M: ChainModule> DynChainModule for M {
    fn name(&self) -> &str {
        ChainModule::name(self)
    }

    fn enabled(&self) -> bool {
        ChainModule::enabled(self)
    }

    fn priority(&self) -> i32 {
        ChainModule::priority(self)
    }

    fn matches_dyn<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Option<MatchPayload>, BoxError>> {
        Box::pin(async move {
            let matched = self.matches(ctx).await?;
            Ok(matched.map(|payload| Box::new(payload) as MatchPayload))
        })
    }

    fn respond_dyn<'a>(
        &'a self,
        ctx: &'a RequestContext,
        matched: MatchPayload,
        previous: Option<&'a ResponseOutcome>,
        handled: &'a [ModuleRef],
    ) -> BoxFuture<'a, Result<Option<ResponseOutcome>, BoxError>> {
        Box::pin(async move {
            let matched = matched.downcast::<M::Matched>().map_err(|_| {
                Box::new(ChainError::PayloadMismatch(ChainModule::name(self).to_string()))
                    as BoxError
            })?;
            self.respond(ctx, *matched, previous, handled).await
        })
    }
}

/// Names of a module list, for diagnostics.
pub fn module_names(modules: &[ModuleRef]) -> Vec<&str> {
    modules.iter().map(|m| m.name()).collect()
}
