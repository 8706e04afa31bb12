//! SQL script templates.
//!
//! Built-in templates are compiled into the binary. A template directory may
//! override any of them by file name. Rendering uses strict undefined
//! behavior so a misspelled variable fails instead of producing empty SQL.

use std::path::Path;

use minijinja::{Environment, Value};
use tracing::debug;
use xdb_io::{DEFAULT_MAX_FILE_SIZE, read_text_safe};

use crate::error::GenerateError;

/// File name of the master key template.
pub const MASTER_KEY_TEMPLATE: &str = "create_master_key.sql.j2";
/// File name of the external data source template.
pub const EXTERNAL_DATA_SOURCE_TEMPLATE: &str = "create_external_data_source.sql.j2";
/// File name of the master table template.
pub const MASTER_ALTER_TABLE_TEMPLATE: &str = "master_alter_table.sql.j2";
/// File name of the master procedure template.
pub const MASTER_CREATE_SP_TEMPLATE: &str = "master_create_sp.sql.j2";

const BUILTIN_MASTER_KEY: &str = include_str!("../templates/create_master_key.sql.j2");
const BUILTIN_EXTERNAL_DATA_SOURCE: &str =
    include_str!("../templates/create_external_data_source.sql.j2");
const BUILTIN_MASTER_ALTER_TABLE: &str = include_str!("../templates/master_alter_table.sql.j2");
const BUILTIN_MASTER_CREATE_SP: &str = include_str!("../templates/master_create_sp.sql.j2");

/// The templates used by `keys`, `sources`, `master` and `template`.
#[derive(Debug, Clone)]
pub struct SqlTemplates {
    env: Environment<'static>,
    master_key: String,
    external_data_source: String,
    master_alter_table: String,
    master_create_sp: String,
}

impl Default for SqlTemplates {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SqlTemplates {
    /// Built-in templates only.
    #[must_use]
    pub fn builtin() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        env.add_filter("sqlstr", sql_string);
        Self {
            env,
            master_key: BUILTIN_MASTER_KEY.to_string(),
            external_data_source: BUILTIN_EXTERNAL_DATA_SOURCE.to_string(),
            master_alter_table: BUILTIN_MASTER_ALTER_TABLE.to_string(),
            master_create_sp: BUILTIN_MASTER_CREATE_SP.to_string(),
        }
    }

    /// Built-in templates, replaced by same-named files found in `dir`.
    ///
    /// # Errors
    /// `Io` when an override exists but cannot be read.
    pub fn with_overrides(dir: &Path) -> Result<Self, GenerateError> {
        let mut templates = Self::builtin();
        for (name, slot) in [
            (MASTER_KEY_TEMPLATE, &mut templates.master_key),
            (EXTERNAL_DATA_SOURCE_TEMPLATE, &mut templates.external_data_source),
            (MASTER_ALTER_TABLE_TEMPLATE, &mut templates.master_alter_table),
            (MASTER_CREATE_SP_TEMPLATE, &mut templates.master_create_sp),
        ] {
            if let Some(source) = read_override(dir, name)? {
                *slot = source;
            }
        }
        Ok(templates)
    }

    /// Render the master key template.
    ///
    /// # Errors
    /// `Template` on syntax errors or undefined variables.
    pub fn render_master_key(&self, ctx: Value) -> Result<String, GenerateError> {
        self.render(MASTER_KEY_TEMPLATE, &self.master_key, ctx)
    }

    /// Render the external data source template.
    ///
    /// # Errors
    /// `Template` on syntax errors or undefined variables.
    pub fn render_external_data_source(&self, ctx: Value) -> Result<String, GenerateError> {
        self.render(EXTERNAL_DATA_SOURCE_TEMPLATE, &self.external_data_source, ctx)
    }

    /// Render the master table template.
    ///
    /// # Errors
    /// `Template` on syntax errors or undefined variables.
    pub fn render_master_alter_table(&self, ctx: Value) -> Result<String, GenerateError> {
        self.render(MASTER_ALTER_TABLE_TEMPLATE, &self.master_alter_table, ctx)
    }

    /// Render the master procedure template.
    ///
    /// # Errors
    /// `Template` on syntax errors or undefined variables.
    pub fn render_master_create_sp(&self, ctx: Value) -> Result<String, GenerateError> {
        self.render(MASTER_CREATE_SP_TEMPLATE, &self.master_create_sp, ctx)
    }

    /// Render an arbitrary template file with the same filters.
    ///
    /// # Errors
    /// `Io` when the file cannot be read, `TemplateFile` on syntax errors or
    /// placeholders missing from `ctx`.
    pub fn render_file(&self, path: &Path, ctx: Value) -> Result<String, GenerateError> {
        let source = read_text_safe(path, DEFAULT_MAX_FILE_SIZE)?;
        self.env
            .render_str(&source, ctx)
            .map(with_final_newline)
            .map_err(|source| GenerateError::TemplateFile {
                path: path.to_path_buf(),
                source,
            })
    }

    fn render(&self, name: &'static str, source: &str, ctx: Value) -> Result<String, GenerateError> {
        self.env
            .render_str(source, ctx)
            .map(with_final_newline)
            .map_err(|source| GenerateError::Template { name, source })
    }
}

fn with_final_newline(mut out: String) -> String {
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn read_override(dir: &Path, name: &str) -> Result<Option<String>, GenerateError> {
    let path = dir.join(name);
    if !path.is_file() {
        return Ok(None);
    }
    debug!(path = %path.display(), "template override");
    Ok(Some(read_text_safe(&path, DEFAULT_MAX_FILE_SIZE)?))
}

/// Quote for a T-SQL string literal body.
#[allow(clippy::needless_pass_by_value)]
fn sql_string(value: String) -> String {
    value.replace('\'', "''")
}
