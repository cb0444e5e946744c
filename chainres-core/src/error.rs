//! Error types for chainres.
//!
//! Module capabilities report failures as [`BoxError`], the same way any
//! third-party code would. The dispatcher wraps those into [`ChainError`]
//! when it needs to describe *where* in the pipeline something went wrong.

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while a request travels through the module chain.
///
/// None of these ever reach the host: the match phase treats them as
/// "does not match", the compose phase logs them and keeps going.
#[derive(Error, Debug)]
pub enum ChainError {
    /// A module's `matches` returned an error.
    #[error("module `{module}` failed to evaluate its match")]
    Probe {
        /// Name of the failing module.
        module: String,
        /// The error reported by the module.
        #[source]
        source: BoxError,
    },

    /// A module's `respond` returned an error.
    #[error("module `{module}` failed to respond")]
    Respond {
        /// Name of the failing module.
        module: String,
        /// The error reported by the module.
        #[source]
        source: BoxError,
    },

    /// A module panicked while one of its capabilities was being awaited.
    #[error("module `{module}` panicked: {message}")]
    Panic {
        /// Name of the module whose future panicked.
        module: String,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// The match payload handed back to a module is not the type it produced.
    #[error("match payload handed to module `{0}` has an unexpected type")]
    PayloadMismatch(String),
}

impl ChainError {
    /// Build a [`ChainError::Panic`] from a caught panic payload.
    pub fn from_panic(module: impl Into<String>, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        ChainError::Panic {
            module: module.into(),
            message,
        }
    }

    /// Name of the module this error is attributed to.
    pub fn module(&self) -> &str {
        match self {
            ChainError::Probe { module, .. }
            | ChainError::Respond { module, .. }
            | ChainError::Panic { module, .. } => module,
            ChainError::PayloadMismatch(module) => module,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payload_is_rendered() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        let err = ChainError::from_panic("jsonp", payload.as_ref());
        assert_eq!(err.to_string(), "module `jsonp` panicked: boom");
        assert_eq!(err.module(), "jsonp");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        let err = ChainError::from_panic("mock", payload.as_ref());
        assert!(err.to_string().ends_with("owned boom"));

        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        let err = ChainError::from_panic("mock", payload.as_ref());
        assert!(err.to_string().ends_with("non-string panic payload"));
    }
}
