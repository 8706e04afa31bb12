//! Core types for the rewrite pipeline.
//!
//! Defines the data structures passed between the pipeline stages.

use std::ops::Range;

use serde::Serialize;

/// One edit request parsed from a change-list line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRequest {
    /// Path as written in the change list, e.g. `./citi_stats/dbo.Proc.sql`.
    pub source_path: String,
    /// First folder of `source_path`: the database the file belongs to.
    pub database_hint: String,
    /// Target line in the SQL file (0-based).
    pub line_index: usize,
    /// Statement text the change list saw on that line.
    pub original_text: String,
    /// Line of the change list this request came from (1-based).
    pub list_line: usize,
}

/// A three-part `database.schema.object` name found in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectReference {
    /// Database part, without brackets.
    pub database: String,
    /// Schema part; `dbo` when the name was written as `db..object`.
    pub schema: String,
    /// Object part, without brackets.
    pub object: String,
    /// Whether the schema was spelled out in the statement.
    pub explicit_schema: bool,
    /// Byte range of the whole reference in the statement.
    #[serde(skip)]
    pub span: Range<usize>,
}

/// Result of processing one change-list line.
///
/// Exactly one outcome is produced per non-blank line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    /// The line was rewritten and the file saved.
    Applied,
    /// The file already holds the rewritten line.
    AlreadyApplied,
    /// The file line differs from what the change list recorded.
    Mismatched {
        /// Current content of the line.
        found: String,
    },
    /// The line number is past the end of the file.
    OutOfBounds {
        /// Number of lines in the file.
        line_count: usize,
    },
    /// The change-list line or its statement could not be interpreted.
    ParseFailed {
        /// Human-readable cause.
        reason: String,
    },
    /// Reading or writing the SQL file failed.
    IoFailed {
        /// Underlying error message.
        reason: String,
    },
}

impl EditOutcome {
    /// Short label for logs and summaries.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyApplied => "already applied",
            Self::Mismatched { .. } => "mismatched",
            Self::OutOfBounds { .. } => "out of bounds",
            Self::ParseFailed { .. } => "parse failed",
            Self::IoFailed { .. } => "io failed",
        }
    }

    /// Whether the file ends up registered for the execution script.
    #[must_use]
    pub fn touches_file(&self) -> bool {
        matches!(self, Self::Applied | Self::AlreadyApplied)
    }
}
