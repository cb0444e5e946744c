//! Module validation.
//!
//! Everything that wants to become a module goes through [`validate`] once,
//! at load time. Typed modules already satisfy the capability contract, so
//! for them only the name is checked. Descriptor files are checked field by
//! field, and every failure reason is reported, not just the first one.

use crate::{
    error::ValidationError,
    modules::{ModuleKinds, ModuleSettings, ModuleSpec},
};
use chainres_core::{DEFAULT_PRIORITY, ModuleRef};
use std::{fmt, path::PathBuf};

/// A zero-argument factory producing a module.
pub type ModuleFactory = Box<dyn FnOnce() -> Option<ModuleRef> + Send>;

/// Something that may turn out to be a module.
pub enum Candidate {
    /// An already constructed module.
    Module(ModuleRef),
    /// A factory, invoked once during validation.
    Factory(ModuleFactory),
    /// A parsed descriptor file.
    Descriptor {
        /// Where the descriptor came from.
        origin: PathBuf,
        /// The descriptor's top-level table.
        table: toml::Table,
    },
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Module(module) => f.debug_tuple("Module").field(&module.name()).finish(),
            Candidate::Factory(_) => f.write_str("Factory"),
            Candidate::Descriptor { origin, .. } => {
                f.debug_struct("Descriptor").field("origin", origin).finish()
            }
        }
    }
}

/// Outcome of validating one candidate.
pub struct Validation {
    /// The normalized module, if the candidate is valid.
    pub module: Option<ModuleRef>,
    /// Every reason the candidate failed.
    pub failures: Vec<ValidationError>,
    /// Name or path identifying the candidate in diagnostics.
    pub origin: String,
}

impl Validation {
    /// Whether the candidate satisfied the contract.
    pub fn is_valid(&self) -> bool {
        self.module.is_some()
    }

    fn valid(origin: String, module: ModuleRef) -> Self {
        Self {
            module: Some(module),
            failures: Vec::new(),
            origin,
        }
    }

    fn invalid(origin: String, failures: Vec<ValidationError>) -> Self {
        Self {
            module: None,
            failures,
            origin,
        }
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validation")
            .field("origin", &self.origin)
            .field("module", &self.module.as_ref().map(|m| m.name()))
            .field("failures", &self.failures)
            .finish()
    }
}

/// Check a candidate against the module contract.
///
/// Never fails: invalid candidates come back with `module: None` and their
/// failure reasons. With `debug` set, each reason is logged.
pub fn validate(candidate: Candidate, kinds: &ModuleKinds, debug: bool) -> Validation {
    let validation = match candidate {
        Candidate::Module(module) => validate_module(module),
        Candidate::Factory(factory) => match factory() {
            Some(module) => validate_module(module),
            None => Validation::invalid("factory".to_string(), vec![ValidationError::NotAnObject]),
        },
        Candidate::Descriptor { origin, table } => {
            validate_descriptor(origin, table, kinds, debug)
        }
    };

    if debug {
        if validation.is_valid() {
            tracing::debug!(origin = %validation.origin, "module validated");
        }
        for failure in &validation.failures {
            tracing::warn!(origin = %validation.origin, reason = %failure, "module rejected");
        }
    }
    validation
}

fn validate_module(module: ModuleRef) -> Validation {
    if module.name().is_empty() {
        return Validation::invalid("<unnamed>".to_string(), vec![ValidationError::MissingName]);
    }
    Validation::valid(module.name().to_string(), module)
}

fn validate_descriptor(
    origin: PathBuf,
    mut table: toml::Table,
    kinds: &ModuleKinds,
    debug: bool,
) -> Validation {
    let display = origin.display().to_string();
    let mut failures = Vec::new();

    let name = match table.remove("name") {
        Some(toml::Value::String(name)) if !name.is_empty() => Some(name),
        _ => {
            failures.push(ValidationError::MissingName);
            None
        }
    };

    let kind = match table.remove("kind") {
        Some(toml::Value::String(kind)) if kinds.contains(&kind) => Some(kind),
        Some(toml::Value::String(kind)) => {
            failures.push(ValidationError::UnknownKind(kind));
            None
        }
        _ => {
            failures.push(ValidationError::MissingKind);
            None
        }
    };

    // Values of the wrong type count as missing and take the default.
    let enabled = match table.remove("enabled") {
        Some(toml::Value::Boolean(enabled)) => enabled,
        Some(value) => {
            ignored_value(debug, &display, "enabled", &value);
            true
        }
        None => true,
    };
    let priority = match table.remove("priority") {
        Some(toml::Value::Integer(priority)) => i32::try_from(priority).unwrap_or_else(|_| {
            ignored_value(debug, &display, "priority", &toml::Value::Integer(priority));
            DEFAULT_PRIORITY
        }),
        Some(value) => {
            ignored_value(debug, &display, "priority", &value);
            DEFAULT_PRIORITY
        }
        None => DEFAULT_PRIORITY,
    };

    let (Some(name), Some(kind)) = (name, kind) else {
        return Validation::invalid(display, failures);
    };

    let spec = ModuleSpec {
        settings: ModuleSettings::new(name.clone())
            .with_enabled(enabled)
            .with_priority(priority),
        options: table,
        base_dir: origin.parent().map(PathBuf::from),
    };
    match kinds.build(&kind, &spec) {
        Some(Ok(module)) => Validation::valid(name, module),
        Some(Err(source)) => Validation::invalid(
            display,
            vec![ValidationError::InvalidOptions { kind, source }],
        ),
        None => Validation::invalid(display, vec![ValidationError::UnknownKind(kind)]),
    }
}

fn ignored_value(debug: bool, origin: &str, key: &str, value: &toml::Value) {
    if debug {
        tracing::warn!(origin, key, value = %value, "invalid value, using default");
    }
}
