//! Merged macro table and its refresh from the two macro sources.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{debug, info};

use crate::sources::{macro_name_from_file, MacroFiles, SecondarySource, SourceError};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to list macro directory {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read macro file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Secondary(#[from] SourceError),
}

/// Provenance counts for a single refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub total: usize,
    pub from_secondary: usize,
    /// File macros that survived the merge.
    pub from_files: usize,
    /// File macros replaced by a secondary entry with the same name.
    pub overridden: usize,
}

/// Immutable name → body snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    entries: HashMap<String, String>,
}

impl MacroTable {
    /// Secondary entries overwrite file entries with the same name.
    pub fn merge(
        files: HashMap<String, String>,
        secondary: HashMap<String, String>,
    ) -> (Self, MergeStats) {
        let file_count = files.len();
        let from_secondary = secondary.len();
        let mut entries = files;
        let mut overridden = 0;
        for (name, body) in secondary {
            if entries.insert(name, body).is_some() {
                overridden += 1;
            }
        }
        let stats = MergeStats {
            total: entries.len(),
            from_secondary,
            from_files: file_count - overridden,
            overridden,
        };
        (Self { entries }, stats)
    }

    /// Exact match first, then the lowercased name.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .or_else(|| self.entries.get(&name.to_lowercase()))
            .map(String::as_str)
    }

    /// All macro names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct MacroStore {
    files: Box<dyn MacroFiles>,
    secondary: Box<dyn SecondarySource>,
    table: RwLock<Arc<MacroTable>>,
}

impl MacroStore {
    pub fn new(files: Box<dyn MacroFiles>, secondary: Box<dyn SecondarySource>) -> Self {
        Self {
            files,
            secondary,
            table: RwLock::new(Arc::new(MacroTable::default())),
        }
    }

    /// Rebuilds the table from both sources. On error the current table is kept.
    pub fn refresh(&self) -> Result<MergeStats, RefreshError> {
        let root = self.files.root().to_path_buf();
        let paths = self.files.list().map_err(|source| RefreshError::List {
            path: root.clone(),
            source,
        })?;

        let mut from_files = HashMap::new();
        for path in paths {
            let Some(name) = macro_name_from_file(&path) else {
                debug!(path = %path.display(), "skipping file without a macro name");
                continue;
            };
            let body = self
                .files
                .read(&path)
                .map_err(|source| RefreshError::Read {
                    path: path.clone(),
                    source,
                })?;
            from_files.insert(name, body);
        }

        let secondary = self.secondary.load()?;
        let (table, stats) = MacroTable::merge(from_files, secondary);
        self.replace(table);

        info!(
            "Loaded {} macros:\n {} added via content pack\n {} added via macros folder",
            stats.total, stats.from_secondary, stats.from_files
        );
        if stats.overridden > 0 {
            info!(
                overridden = stats.overridden,
                "content pack entries replaced macros from {}",
                root.display()
            );
        }
        Ok(stats)
    }

    /// Current table. Holders keep seeing it even if a refresh swaps it out.
    pub fn snapshot(&self) -> Arc<MacroTable> {
        let guard = self.table.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn lookup(&self, name: &str) -> Option<String> {
        self.snapshot().lookup(name).map(str::to_string)
    }

    pub fn list(&self) -> Vec<String> {
        self.snapshot().names()
    }

    fn replace(&self, table: MacroTable) {
        let mut guard = self.table.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(table);
    }
}

impl std::fmt::Debug for MacroStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroStore")
            .field("root", &self.files.root())
            .field("macros", &self.snapshot().len())
            .finish()
    }
}
