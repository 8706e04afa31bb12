//! Supplementary generators: pool setup scripts, master/mirror scripts, the
//! table list, free-form templates, directory run scripts and blank
//! configuration files.
//!
//! Generator config files hold arrays of entries. An entry only needs the
//! fields that differ from the entry before it; missing fields are inherited.

use std::path::{Path, PathBuf};

use minijinja::{Value, context};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;
use xdb_edit::{BatchScriptEmitter, ScriptDialect, ScriptEntry, ScriptError};
use xdb_io::{IoError, write_new};

use crate::error::GenerateError;
use crate::settings::{
    EXTERNAL_DATA_SOURCE_CONFIG, INITIAL_CONFIG, MASTER_KEY_CONFIG, MASTER_MIRROR_CONFIG,
    RewriteSettings, SEARCH_AND_REPLACE_CONFIG, TABLE_LIST_CONFIG,
};
use crate::templates::SqlTemplates;

/// Base name of the script written by [`generate_sqlcmd_script`].
pub const APPLY_SCRIPT_STEM: &str = "apply";

/// A config entry that can inherit from the entry before it.
pub trait ConfigEntry: Clone + Default {
    /// Fields set in `overlay` replace those of `self`.
    #[must_use]
    fn merge(self, overlay: Self) -> Self;
}

/// One `CREATE MASTER KEY` / credential script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterKeyEntry {
    /// Output sub-folder.
    pub folder: Option<String>,
    /// Database the key is created in.
    #[serde(rename = "localDB")]
    pub local_db: Option<String>,
    /// Master key password.
    pub password: Option<String>,
    /// Database scoped credential name.
    pub credential: Option<String>,
    /// Credential identity.
    pub identity: Option<String>,
    /// Credential secret.
    pub secret: Option<String>,
}

impl ConfigEntry for MasterKeyEntry {
    fn merge(self, overlay: Self) -> Self {
        Self {
            folder: overlay.folder.or(self.folder),
            local_db: overlay.local_db.or(self.local_db),
            password: overlay.password.or(self.password),
            credential: overlay.credential.or(self.credential),
            identity: overlay.identity.or(self.identity),
            secret: overlay.secret.or(self.secret),
        }
    }
}

/// One `CREATE EXTERNAL DATA SOURCE` script, or two when `twoway` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDataSourceEntry {
    /// Output sub-folder.
    pub folder: Option<String>,
    /// Database the data source is created in.
    #[serde(rename = "localDB")]
    pub local_db: Option<String>,
    /// Database the data source points at.
    #[serde(rename = "externalDB")]
    pub external_db: Option<String>,
    /// Server hosting the external database.
    #[serde(rename = "serverName")]
    pub server_name: Option<String>,
    /// Credential used to connect.
    pub credential: Option<String>,
    /// `"1"` to also create the reverse data source.
    pub twoway: Option<String>,
}

impl ExternalDataSourceEntry {
    /// Whether the reverse direction is generated too.
    #[must_use]
    pub fn is_two_way(&self) -> bool {
        self.twoway.as_deref().map(str::trim).is_some_and(|v| {
            v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
        })
    }
}

impl ConfigEntry for ExternalDataSourceEntry {
    fn merge(self, overlay: Self) -> Self {
        Self {
            folder: overlay.folder.or(self.folder),
            local_db: overlay.local_db.or(self.local_db),
            external_db: overlay.external_db.or(self.external_db),
            server_name: overlay.server_name.or(self.server_name),
            credential: overlay.credential.or(self.credential),
            twoway: overlay.twoway.or(self.twoway),
        }
    }
}

/// One master table and the database that mirrors it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterMirrorEntry {
    /// Output sub-folder.
    pub folder: Option<String>,
    /// Database owning the table.
    #[serde(rename = "masterDB")]
    pub master_db: Option<String>,
    /// Database holding the mirror copy.
    #[serde(rename = "mirrorDB")]
    pub mirror_db: Option<String>,
    /// Table name in the master database.
    pub table: Option<String>,
}

impl ConfigEntry for MasterMirrorEntry {
    fn merge(self, overlay: Self) -> Self {
        Self {
            folder: overlay.folder.or(self.folder),
            master_db: overlay.master_db.or(self.master_db),
            mirror_db: overlay.mirror_db.or(self.mirror_db),
            table: overlay.table.or(self.table),
        }
    }
}

/// `config.json`: pool-wide settings.
///
/// `template` renders with every field of the file, known here or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialConfig {
    /// Sub-folder `TableList.json` is written to.
    pub folder: Option<String>,
    /// Three-part names, one per line: `CITI_STATS..TB_RESERVATION`.
    #[serde(rename = "masterTables")]
    pub master_tables: Option<String>,
    /// Mirror database, also used in `template` output names.
    #[serde(rename = "mirrorDB")]
    pub mirror_db: Option<String>,
    /// Server hosting the pool.
    #[serde(rename = "serverName")]
    pub server_name: Option<String>,
}

/// One row of `TableList.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Output sub-folder.
    pub folder: Option<String>,
    /// Database the table is used from.
    #[serde(rename = "localDB")]
    pub local_db: Option<String>,
    /// Database owning the table.
    #[serde(rename = "remoteDB")]
    pub remote_db: Option<String>,
    /// Table name.
    pub table: Option<String>,
}

/// Files a generator wrote, and existing files it left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateReport {
    /// Newly written files.
    pub written: Vec<PathBuf>,
    /// Files that already existed.
    pub skipped: Vec<PathBuf>,
}

/// Fill every entry's missing fields from the resolved entry before it.
#[must_use]
pub fn inherit_entries<T: ConfigEntry>(entries: Vec<T>) -> Vec<T> {
    let mut previous = T::default();
    entries
        .into_iter()
        .map(|entry| {
            previous = previous.clone().merge(entry);
            previous.clone()
        })
        .collect()
}

struct Rendered {
    folder: Option<String>,
    file_name: String,
    contents: String,
}

/// Render master key scripts into `out_dir`.
///
/// Every entry is validated and rendered before anything is written.
///
/// # Errors
/// `MissingField`, `Template` or `Io`.
pub fn generate_master_keys(
    entries: Vec<MasterKeyEntry>,
    templates: &SqlTemplates,
    out_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    let mut rendered = Vec::new();
    for (i, entry) in inherit_entries(entries).into_iter().enumerate() {
        let index = i + 1;
        let local_db = required(entry.local_db.as_deref(), index, "localDB")?;
        let contents = templates.render_master_key(context! {
            local_db => local_db,
            password => required(entry.password.as_deref(), index, "password")?,
            credential => required(entry.credential.as_deref(), index, "credential")?,
            identity => required(entry.identity.as_deref(), index, "identity")?,
            secret => required(entry.secret.as_deref(), index, "secret")?,
        })?;
        rendered.push(Rendered {
            file_name: format!("CreateMasterKey__{local_db}__x__x.sql"),
            folder: entry.folder,
            contents,
        });
    }
    save_all(out_dir, rendered)
}

/// Render external data source scripts into `out_dir`.
///
/// Two-way entries produce one script per direction.
///
/// # Errors
/// `MissingField`, `Template` or `Io`.
pub fn generate_external_data_sources(
    entries: Vec<ExternalDataSourceEntry>,
    templates: &SqlTemplates,
    out_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    let mut rendered = Vec::new();
    for (i, entry) in inherit_entries(entries).into_iter().enumerate() {
        let index = i + 1;
        let local_db = required(entry.local_db.as_deref(), index, "localDB")?;
        let external_db = required(entry.external_db.as_deref(), index, "externalDB")?;
        let server_name = required(entry.server_name.as_deref(), index, "serverName")?;
        let credential = required(entry.credential.as_deref(), index, "credential")?;

        let mut directions = vec![(local_db, external_db)];
        if entry.is_two_way() {
            directions.push((external_db, local_db));
        }
        for (from, to) in directions {
            let contents = templates.render_external_data_source(context! {
                local_db => from,
                external_db => to,
                server_name => server_name,
                credential => credential,
            })?;
            rendered.push(Rendered {
                folder: entry.folder.clone(),
                file_name: format!("CreateExternalDataSource_{from}__{to}.sql"),
                contents,
            });
        }
    }
    save_all(out_dir, rendered)
}

type MasterRender = fn(&SqlTemplates, Value) -> Result<String, GenerateError>;

const MASTER_SCRIPTS: [(&str, MasterRender); 2] = [
    ("MasterAlterTable", SqlTemplates::render_master_alter_table),
    ("MasterCreateSP", SqlTemplates::render_master_create_sp),
];

/// Render the master table and master procedure scripts into `out_dir`.
///
/// All table scripts come before all procedure scripts. Files are named
/// `<kind>_<masterDB>_<mirrorDB>_<table>.sql`.
///
/// # Errors
/// `MissingField`, `Template` or `Io`.
pub fn generate_master_mirror(
    entries: Vec<MasterMirrorEntry>,
    templates: &SqlTemplates,
    out_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    let entries = inherit_entries(entries);
    let mut rendered = Vec::new();
    for (kind, render) in MASTER_SCRIPTS {
        for (i, entry) in entries.iter().enumerate() {
            let index = i + 1;
            let master_db = required(entry.master_db.as_deref(), index, "masterDB")?;
            let mirror_db = required(entry.mirror_db.as_deref(), index, "mirrorDB")?;
            let table = required(entry.table.as_deref(), index, "table")?;
            let contents = render(
                templates,
                context! {
                    master_db => master_db,
                    mirror_db => mirror_db,
                    table => table,
                },
            )?;
            rendered.push(Rendered {
                folder: entry.folder.clone(),
                file_name: format!("{kind}_{master_db}_{mirror_db}_{table}.sql"),
                contents,
            });
        }
    }
    save_all(out_dir, rendered)
}

/// Split `masterTables` into table list rows.
///
/// Blank lines are skipped; brackets around parts are dropped.
///
/// # Errors
/// `NotThreePart` for a line that is not `database.schema.table` with a
/// database and a table.
pub fn parse_table_list(tables: &str) -> Result<Vec<TableEntry>, GenerateError> {
    tables
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let parts: Vec<&str> = line.split('.').map(unbracket).collect();
            match parts.as_slice() {
                [database, _, table] if !database.is_empty() && !table.is_empty() => {
                    Ok(TableEntry {
                        remote_db: Some((*database).to_string()),
                        table: Some((*table).to_string()),
                        ..TableEntry::default()
                    })
                }
                _ => Err(GenerateError::NotThreePart(line.to_string())),
            }
        })
        .collect()
}

fn unbracket(part: &str) -> &str {
    part.trim().trim_start_matches('[').trim_end_matches(']')
}

/// Write `TableList.json` from the `masterTables` of `config`; an existing
/// list is left as is.
///
/// # Errors
/// `MissingField`, `NotThreePart`, `Json` or `Io`.
pub fn generate_table_list(
    config: &InitialConfig,
    out_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    let tables = required(config.master_tables.as_deref(), 1, "masterTables")?;
    let entries = parse_table_list(tables)?;
    info!(tables = entries.len(), "table list parsed");
    let rendered = Rendered {
        folder: config.folder.clone(),
        file_name: TABLE_LIST_CONFIG.to_string(),
        contents: format!("{}\n", serde_json::to_string_pretty(&entries)?),
    };
    save_all(out_dir, vec![rendered])
}

/// Render the template file at `template` with the fields of `config.json`.
///
/// Placeholders are field names (`{{ mirrorDB }}`); null fields count as
/// missing. The output is `<template stem>__<mirrorDB>__x__x.sql`.
///
/// # Errors
/// `MissingField` without `mirrorDB`, `TemplateFile` for a placeholder with
/// no matching field, or `Io`.
pub fn generate_from_template(
    template: &Path,
    mut fields: serde_json::Map<String, serde_json::Value>,
    templates: &SqlTemplates,
    out_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    fields.retain(|_, value| !value.is_null());
    let mirror_db = required(
        fields.get("mirrorDB").and_then(serde_json::Value::as_str),
        1,
        "mirrorDB",
    )?;

    let contents = templates.render_file(template, Value::from_serialize(&fields))?;
    let name = template
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();

    let rendered = Rendered {
        folder: None,
        file_name: format!("{stem}__{mirror_db}__x__x.sql"),
        contents,
    };
    save_all(out_dir, vec![rendered])
}

/// Write an `apply` script running every `.sql` file directly inside `dir`.
///
/// Files are listed by name. The script goes into `dir` and is never
/// overwritten.
///
/// # Errors
/// `NotADirectory`, `MissingServer`, `OutputExists`, `Walk`, or `Script`
/// when the folder has no `.sql` file.
pub fn generate_sqlcmd_script(
    dir: &Path,
    server: &str,
    dialect: ScriptDialect,
) -> Result<PathBuf, GenerateError> {
    if !dir.is_dir() {
        return Err(GenerateError::NotADirectory(dir.to_path_buf()));
    }
    let server = server.trim();
    if server.is_empty() {
        return Err(GenerateError::MissingServer);
    }
    let output = dir.join(format!("{APPLY_SCRIPT_STEM}{}", dialect.extension()));
    if output.exists() {
        return Err(GenerateError::OutputExists(output));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let is_sql = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
        if !entry.file_type().is_file() || !is_sql {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push(ScriptEntry {
            run_path: name.clone(),
            database: None,
            git_dir: None,
            git_path: name,
            commented: false,
        });
    }

    match BatchScriptEmitter::new(server, dialect).write(&output, &entries) {
        Ok(()) => Ok(output),
        Err(ScriptError::Io(IoError::AlreadyExists(path))) => Err(GenerateError::OutputExists(path)),
        Err(e) => Err(e.into()),
    }
}

/// Write blank configuration files into `config_dir`, keeping existing ones.
///
/// # Errors
/// `Json` or `Io`.
pub fn write_blank_configs(config_dir: &Path) -> Result<GenerateReport, GenerateError> {
    let blanks = [
        (
            SEARCH_AND_REPLACE_CONFIG,
            serde_json::to_string_pretty(&RewriteSettings::default())?,
        ),
        (
            MASTER_KEY_CONFIG,
            serde_json::to_string_pretty(&[MasterKeyEntry::default()])?,
        ),
        (
            EXTERNAL_DATA_SOURCE_CONFIG,
            serde_json::to_string_pretty(&[ExternalDataSourceEntry::default()])?,
        ),
        (
            MASTER_MIRROR_CONFIG,
            serde_json::to_string_pretty(&[MasterMirrorEntry::default()])?,
        ),
        (
            INITIAL_CONFIG,
            serde_json::to_string_pretty(&InitialConfig::default())?,
        ),
    ];
    let rendered = blanks
        .into_iter()
        .map(|(name, json)| Rendered {
            folder: None,
            file_name: name.to_string(),
            contents: format!("{json}\n"),
        })
        .collect();
    save_all(config_dir, rendered)
}

fn required<'a>(
    value: Option<&'a str>,
    index: usize,
    field: &'static str,
) -> Result<&'a str, GenerateError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(GenerateError::MissingField { index, field })
}

fn save_all(out_dir: &Path, rendered: Vec<Rendered>) -> Result<GenerateReport, GenerateError> {
    let mut report = GenerateReport::default();
    for (i, item) in rendered.into_iter().enumerate() {
        let dir = match item.folder.as_deref().map(str::trim) {
            Some(folder) if !folder.is_empty() => out_dir.join(folder),
            _ => out_dir.to_path_buf(),
        };
        std::fs::create_dir_all(&dir).map_err(IoError::System)?;

        let path = dir.join(&item.file_name);
        match write_new(&path, &item.contents) {
            Ok(()) => {
                info!(n = i + 1, path = %path.display(), "saved");
                report.written.push(path);
            }
            Err(IoError::AlreadyExists(path)) => {
                warn!(n = i + 1, path = %path.display(), "already exists, left as is");
                report.skipped.push(path);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(report)
}
