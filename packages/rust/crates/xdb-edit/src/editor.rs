//! Single-line editor with consistency checks.
//!
//! Every edit re-reads its target file, so a later edit to the same file sees
//! what an earlier one wrote. The checks run in a fixed order:
//!
//! 1. line index past the end → `OutOfBounds`
//! 2. line already equals the new text → `AlreadyApplied`
//! 3. line differs from the change list's text (ignoring case and brackets)
//!    → `Mismatched`
//! 4. otherwise the line is replaced and the file written → `Applied`

use std::path::{Path, PathBuf};

use tracing::debug;
use xdb_io::{read_text_file, write_text_file};

use crate::diff::generate_inline_diff;
use crate::error::ChangeListError;
use crate::types::{ChangeRequest, EditOutcome};

/// Applies change requests to files under a root folder.
#[derive(Debug, Clone)]
pub struct LineEditor {
    root: PathBuf,
    max_file_size: u64,
    dry_run: bool,
}

impl LineEditor {
    /// Editor resolving change-list paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size: xdb_io::DEFAULT_MAX_FILE_SIZE,
            dry_run: false,
        }
    }

    /// Refuse files larger than this many bytes.
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Compute outcomes without writing anything.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolve a change-list path (`./db/x.sql`, `.\db\x.sql`) under the root.
    ///
    /// # Errors
    /// `ParentSegment` when the path contains `..`.
    pub fn resolve(&self, source_path: &str) -> Result<PathBuf, ChangeListError> {
        let normalized = source_path.replace('\\', "/");
        let mut path = self.root.clone();
        for segment in normalized.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(ChangeListError::ParentSegment(source_path.to_string())),
                _ => path.push(segment),
            }
        }
        Ok(path)
    }

    /// Apply one request to the file at `path` (see [`Self::resolve`]),
    /// replacing its line with `new_text`.
    pub fn apply(&self, path: &Path, request: &ChangeRequest, new_text: &str) -> EditOutcome {
        let mut file = match read_text_file(path, self.max_file_size) {
            Ok(file) => file,
            Err(e) => {
                return EditOutcome::IoFailed {
                    reason: format!("read {}: {e}", path.display()),
                };
            }
        };

        let Some(current) = file.line(request.line_index) else {
            return EditOutcome::OutOfBounds {
                line_count: file.line_count(),
            };
        };

        if current == new_text {
            return EditOutcome::AlreadyApplied;
        }

        if canonical(current) != canonical(&request.original_text) {
            return EditOutcome::Mismatched {
                found: current.to_string(),
            };
        }

        debug!(
            path = %path.display(),
            line = request.line_index + 1,
            diff = %generate_inline_diff(current, new_text),
            "line rewritten"
        );

        if self.dry_run {
            return EditOutcome::Applied;
        }

        file.replace_line(request.line_index, new_text);
        match write_text_file(path, &file) {
            Ok(()) => EditOutcome::Applied,
            Err(e) => EditOutcome::IoFailed {
                reason: format!("write {}: {e}", path.display()),
            },
        }
    }
}

/// Comparison form: brackets removed, lower-cased.
fn canonical(line: &str) -> String {
    line.replace(['[', ']'], "").to_lowercase()
}
