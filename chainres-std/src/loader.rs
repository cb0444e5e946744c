//! Module loading.
//!
//! The loader resolves a heterogeneous list of [`ModuleSource`]s into a flat,
//! validated module set:
//!
//! - inline modules and factories are validated directly;
//! - a path to a file is parsed as a TOML descriptor;
//! - a path to a directory is walked recursively, in file-name order, and
//!   every file accepted by the [`FileFilter`] is parsed as a descriptor.
//!
//! Nothing aborts a load. Missing paths, unreadable files and invalid
//! modules are recorded in the [`LoadReport`] and skipped.

use crate::{
    error::{LoadError, ValidationError},
    modules::ModuleKinds,
    validate::{Candidate, ModuleFactory, validate},
};
use chainres_core::{ChainModule, ModuleRef, module_names};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

/// Extension of module descriptor files.
pub const MODULE_EXTENSION: &str = "toml";

/// One entry of the loader's input.
pub enum ModuleSource {
    /// An already constructed module.
    Module(ModuleRef),
    /// A factory returning a module.
    Factory(ModuleFactory),
    /// A descriptor file or a directory of descriptor files.
    Path(PathBuf),
}

impl ModuleSource {
    /// An inline module.
    pub fn module<M: ChainModule>(module: M) -> Self {
        ModuleSource::Module(Arc::new(module))
    }

    /// A factory invoked once at load time.
    pub fn factory<F>(factory: F) -> Self
    where
        F: FnOnce() -> Option<ModuleRef> + Send + 'static,
    {
        ModuleSource::Factory(Box::new(factory))
    }

    /// A file or directory.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ModuleSource::Path(path.into())
    }
}

impl From<ModuleRef> for ModuleSource {
    fn from(module: ModuleRef) -> Self {
        ModuleSource::Module(module)
    }
}

impl From<PathBuf> for ModuleSource {
    fn from(path: PathBuf) -> Self {
        ModuleSource::Path(path)
    }
}

impl From<&Path> for ModuleSource {
    fn from(path: &Path) -> Self {
        ModuleSource::Path(path.to_path_buf())
    }
}

impl fmt::Debug for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSource::Module(module) => f.debug_tuple("Module").field(&module.name()).finish(),
            ModuleSource::Factory(_) => f.write_str("Factory"),
            ModuleSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
        }
    }
}

/// Decides which files of a directory are module descriptors.
#[derive(Clone)]
pub struct FileFilter(Arc<dyn Fn(&Path) -> bool + Send + Sync>);

impl FileFilter {
    /// Accept files the predicate returns `true` for.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Accept files with the given extension.
    pub fn extension(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self::new(move |path| path.extension().is_some_and(|ext| ext == extension.as_str()))
    }

    /// Whether the file is a module descriptor.
    pub fn accepts(&self, path: &Path) -> bool {
        (self.0)(path)
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::extension(MODULE_EXTENSION)
    }
}

impl fmt::Debug for FileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FileFilter")
    }
}

/// A candidate that failed validation.
#[derive(Debug)]
pub struct Rejection {
    /// Name or path of the candidate.
    pub origin: String,
    /// Why it was rejected.
    pub reasons: Vec<ValidationError>,
}

/// Everything the loader found.
#[derive(Default)]
pub struct LoadReport {
    /// Valid, enabled modules in discovery order. This is the dispatch set.
    pub modules: Vec<ModuleRef>,
    /// Valid modules with `enabled = false`.
    pub disabled: Vec<ModuleRef>,
    /// Candidates that failed validation.
    pub rejected: Vec<Rejection>,
    /// Sources that could not be read.
    pub skipped: Vec<LoadError>,
}

impl LoadReport {
    /// The dispatch set.
    pub fn into_modules(self) -> Vec<ModuleRef> {
        self.modules
    }
}

impl fmt::Debug for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadReport")
            .field("modules", &module_names(&self.modules))
            .field("disabled", &module_names(&self.disabled))
            .field("rejected", &self.rejected)
            .field("skipped", &self.skipped)
            .finish()
    }
}

/// Resolves module sources into modules.
#[derive(Debug, Default)]
pub struct Loader {
    kinds: ModuleKinds,
    filter: FileFilter,
    debug: bool,
}

impl Loader {
    /// A loader with the built-in kinds and the `.toml` filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another kind registry.
    pub fn with_kinds(mut self, kinds: ModuleKinds) -> Self {
        self.kinds = kinds;
        self
    }

    /// Use another directory filter.
    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Log diagnostics.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load every source, in order.
    pub fn load<I>(&self, sources: I) -> LoadReport
    where
        I: IntoIterator<Item = ModuleSource>,
    {
        let mut report = LoadReport::default();
        for source in sources {
            match source {
                ModuleSource::Module(module) => self.admit(Candidate::Module(module), &mut report),
                ModuleSource::Factory(factory) => {
                    self.admit(Candidate::Factory(factory), &mut report)
                }
                ModuleSource::Path(path) => self.load_path(&path, &mut report),
            }
        }

        if self.debug {
            tracing::debug!(
                count = report.modules.len(),
                modules = ?module_names(&report.modules),
                "modules loaded"
            );
        }
        report
    }

    fn load_path(&self, path: &Path, report: &mut LoadReport) {
        if path.is_file() {
            self.load_file(path, report);
        } else if path.is_dir() {
            if self.debug {
                tracing::debug!(dir = %path.display(), "loading modules from directory");
            }
            for file in self.module_files(path, report) {
                self.load_file(&file, report);
            }
        } else if path.exists() {
            self.skip(LoadError::Unsupported(path.to_path_buf()), report);
        } else {
            self.skip(LoadError::NotFound(path.to_path_buf()), report);
        }
    }

    /// Descriptor files under `dir`, in walk order.
    fn module_files(&self, dir: &Path, report: &mut LoadReport) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() && self.filter.accepts(entry.path()) => {
                    if self.debug {
                        tracing::debug!(file = %entry.path().display(), "found module file");
                    }
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(source) => self.skip(
                    LoadError::Walk {
                        path: dir.to_path_buf(),
                        source,
                    },
                    report,
                ),
            }
        }
        files
    }

    fn load_file(&self, path: &Path, report: &mut LoadReport) {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(source) => {
                return self.skip(
                    LoadError::Io {
                        path: path.to_path_buf(),
                        source,
                    },
                    report,
                );
            }
        };
        match toml::from_str::<toml::Table>(&source) {
            Ok(table) => self.admit(
                Candidate::Descriptor {
                    origin: path.to_path_buf(),
                    table,
                },
                report,
            ),
            Err(source) => self.skip(
                LoadError::Parse {
                    path: path.to_path_buf(),
                    source,
                },
                report,
            ),
        }
    }

    fn admit(&self, candidate: Candidate, report: &mut LoadReport) {
        let validation = validate(candidate, &self.kinds, self.debug);
        match validation.module {
            Some(module) if module.enabled() => report.modules.push(module),
            Some(module) => {
                if self.debug {
                    tracing::debug!(module = module.name(), "module is disabled");
                }
                report.disabled.push(module);
            }
            None => report.rejected.push(Rejection {
                origin: validation.origin,
                reasons: validation.failures,
            }),
        }
    }

    fn skip(&self, error: LoadError, report: &mut LoadReport) {
        if self.debug {
            tracing::warn!(error = %error, "module source skipped");
        }
        report.skipped.push(error);
    }
}
