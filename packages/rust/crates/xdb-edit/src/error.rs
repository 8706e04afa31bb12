//! Error types for the rewrite pipeline.
//!
//! Library crates use `thiserror` for explicit error enums. Per-line problems
//! are not errors here: they become an `EditOutcome` and the batch goes on.
//! Only setup failures abort a run.

use std::path::PathBuf;

use thiserror::Error;
use xdb_io::IoError;

/// Why a change-list line could not be turned into a `ChangeRequest`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChangeListError {
    /// The line does not have the `./folder/path:line:text` shape.
    #[error("cannot extract path, line number and statement")]
    Malformed,

    /// The line number is missing, zero or too large.
    #[error("invalid line number `{0}`")]
    LineNumber(String),

    /// The statement part after the line number is empty.
    #[error("empty statement")]
    EmptyStatement,

    /// The file path climbs out of the change list's folder.
    #[error("path `{0}` leaves the change-list folder")]
    ParentSegment(String),
}

/// Why no usable three-part name was found in a statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No `prefix*.schema.object` name in the statement.
    #[error("no three-part reference with prefix `{0}`")]
    NoReference(String),

    /// A name matched but its database or object part is empty.
    #[error("incomplete three-part reference `{0}`")]
    Incomplete(String),

    /// More than one reference while multi-reference lines are rejected.
    #[error("{0} references on one line")]
    MultipleReferences(usize),

    /// Self-reference removal found only references to other databases.
    #[error("no reference to `{0}` itself")]
    NoSelfReference(String),
}

/// A naming template that cannot be rendered safely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Placeholder outside `{0}`..`{3}` and the named aliases.
    #[error("unknown placeholder `{{{0}}}` in template `{1}`")]
    UnknownPlaceholder(String, String),

    /// A lone `{` or `}`.
    #[error("unbalanced brace at byte {0} in template `{1}`")]
    UnbalancedBrace(usize, String),

    /// The template produces no text at all.
    #[error("empty template")]
    Empty,
}

/// Execution script emission failures.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Nothing was touched, so there is nothing to run.
    #[error("no files matched, refusing to write an empty script")]
    Empty,

    /// The script could not be written (includes write-once refusal).
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Fatal setup errors. Raised before any file is mutated.
#[derive(Error, Debug)]
pub enum RewriteError {
    /// The change list does not exist.
    #[error("change list not found: {}", .0.display())]
    ChangeListMissing(PathBuf),

    /// The execution script from a previous run is still there.
    #[error("{} already exists", .0.display())]
    OutputExists(PathBuf),

    /// `localServer` is not configured.
    #[error("missing `localServer` in the rewrite configuration")]
    MissingServer,

    /// The database prefix does not compile into a pattern.
    #[error("invalid database prefix: {0}")]
    Prefix(#[from] regex::Error),

    /// The change list could not be read.
    #[error("cannot read change list: {0}")]
    Io(#[from] IoError),
}
