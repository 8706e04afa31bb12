//! Error types for settings loading and script generation.

use std::path::PathBuf;

use thiserror::Error;
use xdb_edit::{ScriptError, TemplateError};
use xdb_io::IoError;

/// Configuration files that cannot be used.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A required configuration file is absent.
    #[error("missing config file {}, run `xdb init` first", .0.display())]
    Missing(PathBuf),

    /// The file exists but cannot be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// Configuration file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid JSON for its structure.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// Configuration file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// `mirrorTemplate` is not a valid naming template.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Failures of the supplementary generators.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// An entry lacks a field even after inheriting from earlier entries.
    #[error("entry #{index}: missing `{field}`")]
    MissingField {
        /// 1-based entry number.
        index: usize,
        /// JSON field name.
        field: &'static str,
    },

    /// A SQL template failed to render.
    #[error("template `{name}`: {source}")]
    Template {
        /// Template file name.
        name: &'static str,
        /// Underlying error.
        source: minijinja::Error,
    },

    /// A user-supplied template failed to render, e.g. an unknown placeholder.
    #[error("template {}: {source}", path.display())]
    TemplateFile {
        /// Template path.
        path: PathBuf,
        /// Underlying error.
        source: minijinja::Error,
    },

    /// A table list line is not `database.schema.table`.
    #[error("must be a 3-part name: `{0}`")]
    NotThreePart(String),

    /// The directory to scan does not exist.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// `localServer` is not configured.
    #[error("missing `localServer` in the rewrite configuration")]
    MissingServer,

    /// The output script is left over from a previous run.
    #[error("{} already exists", .0.display())]
    OutputExists(PathBuf),

    /// Directory scan failure.
    #[error("cannot scan directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Blank configuration serialization failure.
    #[error("cannot serialize configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Execution script failure.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// File system failure.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Configuration failure.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
