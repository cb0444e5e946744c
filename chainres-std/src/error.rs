//! Errors raised while loading and validating modules.
//!
//! Neither kind aborts a load: the loader records them in its
//! [`LoadReport`](crate::loader::LoadReport) and moves on to the next entry.

use chainres_core::BoxError;
use std::path::PathBuf;
use thiserror::Error;

/// A module source that could not be read at all.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The path does not exist.
    #[error("module path `{0}` does not exist")]
    NotFound(PathBuf),

    /// The path exists but is neither a file nor a directory.
    #[error("module path `{0}` is neither a file nor a directory")]
    Unsupported(PathBuf),

    /// Reading a module file failed.
    #[error("failed to read module file `{path}`")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Walking a module directory failed.
    #[error("failed to walk module directory `{path}`")]
    Walk {
        /// The directory being walked.
        path: PathBuf,
        /// The underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// A module file is not valid TOML.
    #[error("failed to parse module file `{path}`")]
    Parse {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// One reason a candidate failed the module contract.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The candidate, or what its factory returned, is not a module.
    #[error("module must be an object or a factory returning one")]
    NotAnObject,

    /// `name` is missing, not a string, or empty.
    #[error("`name` must be a non-empty string")]
    MissingName,

    /// `kind` is missing or not a string, so there is no `match`/`respond`.
    #[error("`kind` must name a module kind providing match and respond")]
    MissingKind,

    /// `kind` names a kind nobody registered.
    #[error("unknown module kind `{0}`")]
    UnknownKind(String),

    /// The kind refused the descriptor's options.
    #[error("invalid options for module kind `{kind}`: {source}")]
    InvalidOptions {
        /// The kind that rejected the options.
        kind: String,
        /// Why the kind rejected them.
        #[source]
        source: BoxError,
    },
}
