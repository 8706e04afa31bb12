//! Immutable configuration of one rewrite run.
//!
//! Built once by the caller (the CLI merges defaults, JSON and flags) and
//! passed by value into [`crate::Rewriter`]. Nothing here is read from global
//! state, so tests can point a run at a temporary tree.

use std::path::{Path, PathBuf};

use crate::naming::{MultiReferencePolicy, NamingPolicy};
use crate::script::{BatchScriptEmitter, ScriptDialect};

/// Database prefix used when none is configured.
pub const DEFAULT_DATABASE_PREFIX: &str = "CITI_";

/// Everything a rewrite run needs.
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    /// The change list; its folder is the root of the SQL tree.
    pub change_list: PathBuf,
    /// Server the execution script runs `sqlcmd` against.
    pub server: String,
    /// How references are rewritten.
    pub policy: NamingPolicy,
    /// Databases handled start with this prefix.
    pub database_prefix: String,
    /// Execution script flavour.
    pub dialect: ScriptDialect,
    /// Handling of lines with several references.
    pub multi_reference: MultiReferencePolicy,
    /// Size limit for SQL files, in bytes.
    pub max_file_size: u64,
    /// Compute outcomes only; write neither SQL files nor the script.
    pub dry_run: bool,
}

impl RewriteConfig {
    /// Configuration with defaults for everything but the inputs.
    pub fn new(change_list: impl Into<PathBuf>, server: impl Into<String>, policy: NamingPolicy) -> Self {
        Self {
            change_list: change_list.into(),
            server: server.into(),
            policy,
            database_prefix: DEFAULT_DATABASE_PREFIX.to_string(),
            dialect: ScriptDialect::default(),
            multi_reference: MultiReferencePolicy::default(),
            max_file_size: xdb_io::DEFAULT_MAX_FILE_SIZE,
            dry_run: false,
        }
    }

    /// Folder holding the change list (`.` for a bare file name).
    #[must_use]
    pub fn root(&self) -> &Path {
        match self.change_list.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Where the execution script goes.
    #[must_use]
    pub fn script_path(&self) -> PathBuf {
        BatchScriptEmitter::script_path(&self.change_list, self.dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_of_bare_file_name() {
        let config = RewriteConfig::new("grep.txt", "srv", NamingPolicy::SelfReference);
        assert_eq!(config.root(), Path::new("."));
        assert_eq!(config.script_path(), Path::new("grep.ps1"));
    }

    #[test]
    fn test_root_of_nested_change_list() {
        let mut config = RewriteConfig::new("/src/db/selfrefs.txt", "srv", NamingPolicy::SelfReference);
        config.dialect = ScriptDialect::Cmd;
        assert_eq!(config.root(), Path::new("/src/db"));
        assert_eq!(config.script_path(), Path::new("/src/db/selfrefs.bat"));
    }
}
