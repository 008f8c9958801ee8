//! Macro sources: the macro directory and the secondary name → body provider.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use content_pack::{load_pack_path, ContentError, Severity, ValidationIssue};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Lists and reads macro files from a single directory.
pub trait MacroFiles: Send + Sync {
    fn root(&self) -> &Path;
    /// Regular files directly inside the root, in a stable order.
    fn list(&self) -> io::Result<Vec<PathBuf>>;
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Supplies the secondary macro mapping, which wins over files on collision.
pub trait SecondarySource: Send + Sync {
    fn load(&self) -> Result<HashMap<String, String>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to load content pack {path}: {source}")]
    Content {
        path: PathBuf,
        #[source]
        source: ContentError,
    },
}

#[derive(Debug, Clone)]
pub struct MacroDir {
    root: PathBuf,
}

impl MacroDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl MacroFiles for MacroDir {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Derives a macro name from a file path: the file name up to its first dot.
///
/// Returns `None` for names that are empty after stripping (`.gitkeep`) or
/// are not valid UTF-8.
pub fn macro_name_from_file(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.split('.').next().unwrap_or_default();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// The default asset: an empty dictionary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySource;

impl SecondarySource for EmptySource {
    fn load(&self) -> Result<HashMap<String, String>, SourceError> {
        Ok(HashMap::new())
    }
}

#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    macros: HashMap<String, String>,
}

impl StaticSource {
    pub fn new(macros: HashMap<String, String>) -> Self {
        Self { macros }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl SecondarySource for StaticSource {
    fn load(&self) -> Result<HashMap<String, String>, SourceError> {
        Ok(self.macros.clone())
    }
}

/// YAML content pack on disk. A missing file behaves like the empty asset.
#[derive(Debug, Clone)]
pub struct ContentPackSource {
    path: PathBuf,
}

impl ContentPackSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SecondarySource for ContentPackSource {
    fn load(&self) -> Result<HashMap<String, String>, SourceError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "content pack not found, using empty mapping");
            return Ok(HashMap::new());
        }
        let loaded = match load_pack_path(&self.path) {
            Ok(loaded) => loaded,
            Err(source) => {
                if let ContentError::Validation(issues) = &source {
                    log_issues(issues);
                }
                return Err(SourceError::Content {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        log_issues(&loaded.issues);
        Ok(loaded.macros)
    }
}

fn log_issues(issues: &[ValidationIssue]) {
    for issue in issues {
        match issue.severity {
            Severity::Error => error!(path = %issue.path, "{}", issue.message),
            Severity::Warning => warn!(path = %issue.path, "{}", issue.message),
            Severity::Info => info!(path = %issue.path, "{}", issue.message),
        }
    }
}
