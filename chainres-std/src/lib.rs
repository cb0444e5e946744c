//! # chainres-std
//!
//! Standard implementations for the chainres dispatcher.
//!
//! This crate provides:
//! - **Validation**: [`validate`] checks candidates against the module contract
//! - **Loading**: [`Loader`] resolves inline modules, factories, files and
//!   directories into a module set
//! - **Module kinds**: [`ModuleKinds`] and the built-in file, JSONP and static
//!   modules
//! - **Testing**: scripted modules for dispatcher tests

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use chainres_core;

// Modules
pub mod error;
pub mod loader;
pub mod modules;
pub mod testing;
pub mod validate;

pub use error::{LoadError, ValidationError};
pub use loader::{FileFilter, LoadReport, Loader, MODULE_EXTENSION, ModuleSource, Rejection};
pub use modules::{ModuleKinds, ModuleSettings, ModuleSpec};
pub use validate::{Candidate, ModuleFactory, Validation, validate};
