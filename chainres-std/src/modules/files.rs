//! File lookup shared by the file-mapping modules.

use chainres_core::{BoxError, Content, ResponseOutcome};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Fallback `Content-Type` for unmapped extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// A file found under a module's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    /// Path of the file.
    pub full_path: PathBuf,
    /// File name including its extension.
    pub file_name: String,
    /// Extension with its leading dot, e.g. `.json`.
    pub extension: Option<String>,
}

impl FileMatch {
    fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"));
        Some(Self {
            full_path: path.to_path_buf(),
            file_name,
            extension,
        })
    }

    /// File name with its last extension removed.
    pub fn stem(&self) -> &str {
        match &self.extension {
            Some(ext) => self
                .file_name
                .strip_suffix(ext.as_str())
                .unwrap_or(&self.file_name),
            None => &self.file_name,
        }
    }
}

/// All files under `dir`, recursively, in file-name order.
///
/// Unreadable entries are skipped.
pub fn list_files(dir: &Path) -> Vec<FileMatch> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| FileMatch::from_path(entry.path()))
        .collect()
}

/// Find a file by exact name, falling back to a name without extension.
pub fn find_file(dir: &Path, name: &str) -> Option<FileMatch> {
    if name.is_empty() {
        return None;
    }
    let files = list_files(dir);
    let exact = files.iter().position(|f| f.file_name == name);
    let index = exact.or_else(|| files.iter().position(|f| f.extension.is_some() && f.stem() == name))?;
    files.into_iter().nth(index)
}

/// [`find_file`] on the blocking pool, for use inside `matches`.
///
/// The directory walk is synchronous, so it must not run on an async worker.
/// Requires a Tokio runtime.
pub async fn locate_file(dir: &Path, name: &str) -> Result<Option<FileMatch>, BoxError> {
    if name.is_empty() {
        return Ok(None);
    }
    let dir = dir.to_path_buf();
    let name = name.to_string();
    let found = tokio::task::spawn_blocking(move || find_file(&dir, &name)).await?;
    Ok(found)
}

/// Extension to `Content-Type` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypes {
    types: HashMap<String, String>,
}

impl ContentTypes {
    /// Add or replace a mapping. The extension may be given with or without
    /// its leading dot.
    pub fn insert(&mut self, extension: &str, content_type: impl Into<String>) {
        let key = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{extension}")
        };
        self.types.insert(key, content_type.into());
    }

    /// Defaults plus the given overrides.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut types = Self::default();
        for (extension, content_type) in overrides {
            types.insert(extension, content_type.clone());
        }
        types
    }

    /// The content type for an extension.
    pub fn lookup(&self, extension: Option<&str>) -> &str {
        extension
            .and_then(|ext| self.types.get(ext))
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

impl Default for ContentTypes {
    fn default() -> Self {
        let mut types = Self {
            types: HashMap::new(),
        };
        types.insert(".json", "application/json");
        types.insert(".js", "application/javascript");
        types.insert(".html", "text/html");
        types
    }
}

/// Read a matched file into a response with a matching `Content-Type`.
pub async fn file_response(
    file: &FileMatch,
    types: &ContentTypes,
) -> Result<ResponseOutcome, BoxError> {
    let bytes = tokio::fs::read(&file.full_path).await?;
    let content = match String::from_utf8(bytes) {
        Ok(text) => Content::Text(text),
        Err(err) => Content::Binary(err.into_bytes()),
    };
    Ok(ResponseOutcome {
        content: Some(content),
        ..ResponseOutcome::new()
    }
    .header("Content-Type", types.lookup(file.extension.as_deref())))
}
