//! JSON settings for the rewrite commands.
//!
//! Loads and merges:
//! - Built-in defaults
//! - `<config-dir>/SearchAndReplaceConfig.json`
//! - Command-line flags
//!
//! Each layer is an `Option`-field struct; later layers win field by field.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdb_edit::{
    DEFAULT_DATABASE_PREFIX, MultiReferencePolicy, NamingPolicy, NamingTemplate, RewriteConfig,
    ScriptDialect,
};

use crate::error::SettingsError;

/// Default configuration directory, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "config";
/// Rewrite settings file name.
pub const SEARCH_AND_REPLACE_CONFIG: &str = "SearchAndReplaceConfig.json";
/// Master key entries file name.
pub const MASTER_KEY_CONFIG: &str = "MasterKeyConfig.json";
/// External data source entries file name.
pub const EXTERNAL_DATA_SOURCE_CONFIG: &str = "ExternalDataSourceConfig.json";
/// Master/mirror table entries file name.
pub const MASTER_MIRROR_CONFIG: &str = "MasterMirrorConfig.json";
/// Pool-wide settings and master table list, also the `template` context.
pub const INITIAL_CONFIG: &str = "config.json";
/// Table list written by `config`.
pub const TABLE_LIST_CONFIG: &str = "TableList.json";
/// Mirror naming used when none is configured: `mr_<database>__<object>`.
pub const DEFAULT_MIRROR_TEMPLATE: &str = "mr_{1}__{2}";

/// Which naming policy a command runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// `selfref`
    SelfReference,
    /// `mirrorref`
    Mirror,
}

/// One layer of rewrite settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteSettings {
    /// Server the execution script targets.
    pub local_server: Option<String>,
    /// Prefix shared by the database names to rewrite.
    pub database_prefix: Option<String>,
    /// Naming template for `mirrorref`.
    pub mirror_template: Option<String>,
    /// Execution script flavour.
    pub script_dialect: Option<ScriptDialect>,
    /// Handling of lines with several references.
    pub multi_reference: Option<MultiReferencePolicy>,
    /// Size limit for SQL files, in bytes.
    pub max_file_size: Option<u64>,
}

impl RewriteSettings {
    /// Built-in defaults, the bottom layer.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            local_server: None,
            database_prefix: Some(DEFAULT_DATABASE_PREFIX.to_string()),
            mirror_template: Some(DEFAULT_MIRROR_TEMPLATE.to_string()),
            script_dialect: Some(ScriptDialect::default()),
            multi_reference: Some(MultiReferencePolicy::default()),
            max_file_size: Some(xdb_io::DEFAULT_MAX_FILE_SIZE),
        }
    }

    /// Fields set in `overlay` replace those of `self`.
    #[must_use]
    pub fn merge(self, overlay: Self) -> Self {
        Self {
            local_server: overlay.local_server.or(self.local_server),
            database_prefix: overlay.database_prefix.or(self.database_prefix),
            mirror_template: overlay.mirror_template.or(self.mirror_template),
            script_dialect: overlay.script_dialect.or(self.script_dialect),
            multi_reference: overlay.multi_reference.or(self.multi_reference),
            max_file_size: overlay.max_file_size.or(self.max_file_size),
        }
    }

    /// Turn merged settings into the configuration of one run.
    ///
    /// A missing server is passed through empty; the rewriter reports it
    /// during setup.
    ///
    /// # Errors
    /// `Template` when the mirror template does not parse.
    pub fn resolve(
        self,
        change_list: impl Into<PathBuf>,
        kind: PolicyKind,
        dry_run: bool,
    ) -> Result<RewriteConfig, SettingsError> {
        let policy = match kind {
            PolicyKind::SelfReference => NamingPolicy::SelfReference,
            PolicyKind::Mirror => {
                let source = self
                    .mirror_template
                    .as_deref()
                    .unwrap_or(DEFAULT_MIRROR_TEMPLATE);
                NamingPolicy::Mirror(NamingTemplate::parse(source)?)
            }
        };

        let mut config =
            RewriteConfig::new(change_list, self.local_server.unwrap_or_default(), policy);
        if let Some(prefix) = self.database_prefix {
            config.database_prefix = prefix;
        }
        if let Some(dialect) = self.script_dialect {
            config.dialect = dialect;
        }
        if let Some(multi_reference) = self.multi_reference {
            config.multi_reference = multi_reference;
        }
        if let Some(max_file_size) = self.max_file_size {
            config.max_file_size = max_file_size;
        }
        config.dry_run = dry_run;
        Ok(config)
    }
}

/// Read a JSON file; `Ok(None)` when it does not exist.
///
/// # Errors
/// `Read` or `Parse`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SettingsError> {
    if !path.exists() {
        debug!(path = %path.display(), "config file not found");
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Defaults merged with `SearchAndReplaceConfig.json` (if present).
///
/// # Errors
/// `Read` or `Parse` for an unusable file.
pub fn load_rewrite_settings(config_dir: &Path) -> Result<RewriteSettings, SettingsError> {
    let file = load_json::<RewriteSettings>(&config_dir.join(SEARCH_AND_REPLACE_CONFIG))?;
    Ok(RewriteSettings::defaults().merge(file.unwrap_or_default()))
}

/// A JSON file that must exist.
///
/// # Errors
/// `Missing`, `Read` or `Parse`.
pub fn load_required<T: DeserializeOwned>(path: &Path) -> Result<T, SettingsError> {
    load_json(path)?.ok_or_else(|| SettingsError::Missing(path.to_path_buf()))
}

/// Entries of a generator config file, which must exist.
///
/// # Errors
/// `Missing`, `Read` or `Parse`.
pub fn load_entries<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SettingsError> {
    load_required(path)
}
