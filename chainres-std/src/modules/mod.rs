//! Standard module kinds.
//!
//! Module files on disk do not contain code; they are TOML descriptors that
//! name a *kind* and carry that kind's options:
//!
//! ```toml
//! name = "mock-files"
//! kind = "local-file-map"
//! priority = 50
//! dir = "mock-files"
//! ```
//!
//! A [`ModuleKinds`] registry turns a descriptor into a live module. The
//! built-in kinds are:
//!
//! | kind | module |
//! |---|---|
//! | `local-file-map` | [`LocalFileMap`] |
//! | `url-query-map` | [`UrlQueryMap`] |
//! | `jsonp` | [`Jsonp`] |
//! | `static` | [`StaticContent`] |

pub mod files;
pub mod jsonp;
pub mod local_file_map;
pub mod static_content;
pub mod url_query_map;

pub use files::{ContentTypes, FileMatch};
pub use jsonp::Jsonp;
pub use local_file_map::LocalFileMap;
pub use static_content::StaticContent;
pub use url_query_map::UrlQueryMap;

use chainres_core::{BoxError, DEFAULT_PRIORITY, ModuleRef};
use serde::de::DeserializeOwned;
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

/// Identity and ordering shared by every module kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSettings {
    /// Module name.
    pub name: String,
    /// Whether the module takes part in dispatch.
    pub enabled: bool,
    /// Higher runs earlier.
    pub priority: i32,
}

impl ModuleSettings {
    /// Enabled settings with the default priority.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set initial enabled state.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A validated descriptor, ready to be turned into a module by its kind.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    /// Normalized identity.
    pub settings: ModuleSettings,
    /// Every descriptor key besides `name`, `enabled`, `priority` and `kind`.
    pub options: toml::Table,
    /// Directory relative option paths resolve against.
    pub base_dir: Option<PathBuf>,
}

impl ModuleSpec {
    /// Deserialize the kind-specific options.
    pub fn options<T: DeserializeOwned>(&self) -> Result<T, BoxError> {
        toml::Value::Table(self.options.clone())
            .try_into()
            .map_err(|e: toml::de::Error| Box::new(e) as BoxError)
    }

    /// Resolve a path option against the descriptor's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

type KindBuilder = Box<dyn Fn(&ModuleSpec) -> Result<ModuleRef, BoxError> + Send + Sync>;

/// Registry of module kinds available to descriptor files.
pub struct ModuleKinds {
    kinds: HashMap<String, KindBuilder>,
}

impl ModuleKinds {
    /// A registry without any kind.
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// A registry with the built-in kinds.
    pub fn builtin() -> Self {
        Self::empty()
            .register(local_file_map::KIND, LocalFileMap::from_spec)
            .register(url_query_map::KIND, UrlQueryMap::from_spec)
            .register(jsonp::KIND, Jsonp::from_spec)
            .register(static_content::KIND, StaticContent::from_spec)
    }

    /// Register a kind, replacing any kind of the same name.
    pub fn register<F>(mut self, kind: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&ModuleSpec) -> Result<ModuleRef, BoxError> + Send + Sync + 'static,
    {
        self.kinds.insert(kind.into(), Box::new(builder));
        self
    }

    /// Whether a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Build a module, or `None` if the kind is unknown.
    pub fn build(&self, kind: &str, spec: &ModuleSpec) -> Option<Result<ModuleRef, BoxError>> {
        self.kinds.get(kind).map(|builder| builder(spec))
    }

    /// Registered kind names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ModuleKinds {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for ModuleKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
