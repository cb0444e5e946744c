//! On/off state of a dispatcher.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared on/off flag.
///
/// Clones share the flag, so a toggle through one dispatcher clone is seen by
/// every request scheduled after it on any clone.
#[derive(Debug, Clone)]
pub struct SwitchHandle(Arc<AtomicBool>);

impl SwitchHandle {
    /// Create a new handle with the given initial state.
    pub fn new(on: bool) -> Self {
        Self(Arc::new(AtomicBool::new(on)))
    }

    /// Whether the dispatcher is switched on.
    pub fn is_on(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Flip the state, returning the new one.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }
}

impl Default for SwitchHandle {
    fn default() -> Self {
        Self::new(true)
    }
}
