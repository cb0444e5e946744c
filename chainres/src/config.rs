//! Dispatcher configuration.
//!
//! One [`ChainConfig`] is handed to each dispatcher at construction; nothing
//! here is process-global.
//!
//! ```toml
//! debug = true
//! switch_path = "/@chainres/switch"
//! switch_on = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Path that toggles the dispatcher on and off when none is configured.
pub const DEFAULT_SWITCH_PATH: &str = "/@chainres/switch";

/// Errors reading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file `{path}`")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for one dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// Emit diagnostic logs. Hard errors are logged regardless.
    pub debug: bool,
    /// Requests to this exact path toggle the dispatcher.
    pub switch_path: String,
    /// Whether the dispatcher starts switched on.
    pub switch_on: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            debug: false,
            switch_path: DEFAULT_SWITCH_PATH.to_string(),
            switch_on: true,
        }
    }
}

impl ChainConfig {
    /// The default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set debug logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the switch path.
    pub fn with_switch_path(mut self, switch_path: impl Into<String>) -> Self {
        self.switch_path = switch_path.into();
        self
    }

    /// Set the initial switch state.
    pub fn with_switch_on(mut self, switch_on: bool) -> Self {
        self.switch_on = switch_on;
        self
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
