//! Execution script emission.
//!
//! For every touched file the script runs it with `sqlcmd` against its
//! database and, only if that succeeded, stages it with `git`. Files whose
//! edits were all found already applied are kept in the script but commented
//! out, so the script doubles as an audit trail.
//!
//! ```text
//! sqlcmd -b -S srv -d citi_stats -i "citi_stats/dbo.P.sql"
//! if ($LASTEXITCODE -eq 0) {git -C citi_stats add "dbo.P.sql"}
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ScriptError;
use crate::ledger::TouchedFile;

/// Shell flavour of the execution script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptDialect {
    /// PowerShell (`.ps1`), gated on `$LASTEXITCODE`.
    #[default]
    PowerShell,
    /// Windows command interpreter (`.bat`), gated on `%ERRORLEVEL%`.
    Cmd,
}

impl ScriptDialect {
    /// File extension including the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::PowerShell => ".ps1",
            Self::Cmd => ".bat",
        }
    }

    fn comment(self) -> &'static str {
        match self {
            Self::PowerShell => "#",
            Self::Cmd => "REM ",
        }
    }

    fn newline(self) -> &'static str {
        match self {
            Self::PowerShell => "\n",
            Self::Cmd => "\r\n",
        }
    }

    fn stage_command(self, git: &str) -> String {
        match self {
            Self::PowerShell => format!("if ($LASTEXITCODE -eq 0) {{{git}}}"),
            Self::Cmd => format!("if %ERRORLEVEL% EQU 0 {git}"),
        }
    }
}

/// One two-line group of the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    /// Path passed to `sqlcmd -i`, relative to where the script runs.
    pub run_path: String,
    /// Database for `sqlcmd -d`; omitted when `None`.
    pub database: Option<String>,
    /// Repository folder for `git -C`; omitted when `None`.
    pub git_dir: Option<String>,
    /// Path passed to `git add`, relative to `git_dir`.
    pub git_path: String,
    /// Emit both lines commented out.
    pub commented: bool,
}

/// Renders and writes execution scripts.
#[derive(Debug, Clone)]
pub struct BatchScriptEmitter {
    server: String,
    dialect: ScriptDialect,
}

impl BatchScriptEmitter {
    /// Emitter targeting `server`.
    pub fn new(server: impl Into<String>, dialect: ScriptDialect) -> Self {
        Self {
            server: server.into(),
            dialect,
        }
    }

    /// Script path for a change list: same folder and stem, dialect extension.
    #[must_use]
    pub fn script_path(change_list: &Path, dialect: ScriptDialect) -> PathBuf {
        let stem = change_list
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = format!("{stem}{}", dialect.extension());
        match change_list.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Turn ledger entries into script entries relative to `root`.
    ///
    /// The first path segment under the root is the database folder, which
    /// is also the repository `git -C` runs in.
    #[must_use]
    pub fn ledger_entries(root: &Path, files: &[TouchedFile]) -> Vec<ScriptEntry> {
        files
            .iter()
            .map(|file| {
                let segments = relative_segments(root, &file.path);
                let (git_dir, git_path) = match segments.split_first() {
                    Some((first, rest)) if !rest.is_empty() => {
                        (Some(first.clone()), rest.join("/"))
                    }
                    _ => (None, segments.join("/")),
                };
                ScriptEntry {
                    run_path: segments.join("/"),
                    database: Some(file.database.clone()),
                    git_dir,
                    git_path,
                    commented: !file.applied,
                }
            })
            .collect()
    }

    /// Render the script text.
    ///
    /// # Errors
    /// `ScriptError::Empty` when there are no entries.
    pub fn render(&self, entries: &[ScriptEntry]) -> Result<String, ScriptError> {
        if entries.is_empty() {
            return Err(ScriptError::Empty);
        }

        let nl = self.dialect.newline();
        let mut out = String::new();
        for entry in entries {
            let prefix = if entry.commented {
                self.dialect.comment()
            } else {
                ""
            };

            let database = entry
                .database
                .as_deref()
                .map(|db| format!(" -d {db}"))
                .unwrap_or_default();
            let git_dir = entry
                .git_dir
                .as_deref()
                .map(|dir| format!(" -C {dir}"))
                .unwrap_or_default();
            let git = format!("git{git_dir} add \"{}\"", entry.git_path);

            out.push_str(&format!(
                "{prefix}sqlcmd -b -S {}{database} -i \"{}\"{nl}",
                self.server, entry.run_path
            ));
            out.push_str(prefix);
            out.push_str(&self.dialect.stage_command(&git));
            out.push_str(nl);
        }
        // Trailing blank line after the last group.
        out.push_str(nl);
        Ok(out)
    }

    /// Render and write the script. Never overwrites.
    ///
    /// # Errors
    /// `Empty`, or `Io` wrapping `AlreadyExists` / the write failure.
    pub fn write(&self, path: &Path, entries: &[ScriptEntry]) -> Result<(), ScriptError> {
        let script = self.render(entries)?;
        xdb_io::write_new(path, &script)?;
        info!(path = %path.display(), entries = entries.len(), "execution script saved");
        Ok(())
    }
}

fn relative_segments(root: &Path, path: &Path) -> Vec<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
