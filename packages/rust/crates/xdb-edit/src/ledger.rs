//! Touched-file ledger.
//!
//! Ordered by first touch and keyed by absolute path. The database recorded
//! for a file is the one from its first edit; `applied` turns true as soon as
//! any edit actually changed the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// One file the run touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TouchedFile {
    /// Absolute path of the SQL file.
    pub path: PathBuf,
    /// Database to run the file against (lower-cased).
    pub database: String,
    /// Whether any edit in this run rewrote the file.
    pub applied: bool,
}

/// Files to include in the execution script, in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct TouchedFileLedger {
    entries: Vec<TouchedFile>,
    index: HashMap<PathBuf, usize>,
}

impl TouchedFileLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a touched file.
    ///
    /// `applied` is false for edits that found the line already rewritten.
    pub fn record(&mut self, path: &Path, database: &str, applied: bool) {
        if let Some(&idx) = self.index.get(path) {
            self.entries[idx].applied |= applied;
            return;
        }
        self.index.insert(path.to_path_buf(), self.entries.len());
        self.entries.push(TouchedFile {
            path: path.to_path_buf(),
            database: database.to_lowercase(),
            applied,
        });
    }

    /// Entries in first-seen order.
    #[must_use]
    pub fn entries(&self) -> &[TouchedFile] {
        &self.entries
    }

    /// Number of distinct files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hand the entries over to the emitter.
    #[must_use]
    pub fn into_entries(self) -> Vec<TouchedFile> {
        self.entries
    }
}
