#![allow(clippy::doc_markdown)]

//! xdb-cli - Settings and generators behind the `xdb` binary
//!
//! The rewrite itself lives in `xdb-edit`. This crate adds what the command
//! line needs around it: layered JSON settings and the supplementary script
//! generators used when preparing an elastic pool.
//!
//! # Architecture
//!
//! ```text
//! xdb-cli/src/
//! ├── lib.rs        # Re-exports (this file)
//! ├── main.rs       # `xdb` binary: logging, dispatch, exit codes
//! ├── cli.rs        # clap definitions
//! ├── error.rs      # SettingsError, GenerateError
//! ├── settings.rs   # RewriteSettings overlay
//! ├── templates.rs  # Embedded minijinja templates
//! └── generate.rs   # keys, sources, master, config, template, sqlcmd, init
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod error;
mod generate;
mod settings;
mod templates;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use error::{GenerateError, SettingsError};
pub use generate::{
    APPLY_SCRIPT_STEM, ConfigEntry, ExternalDataSourceEntry, GenerateReport, InitialConfig,
    MasterKeyEntry, MasterMirrorEntry, TableEntry, generate_external_data_sources,
    generate_from_template, generate_master_keys, generate_master_mirror, generate_sqlcmd_script,
    generate_table_list, inherit_entries, parse_table_list, write_blank_configs,
};
pub use settings::{
    DEFAULT_CONFIG_DIR, DEFAULT_MIRROR_TEMPLATE, EXTERNAL_DATA_SOURCE_CONFIG, INITIAL_CONFIG,
    MASTER_KEY_CONFIG, MASTER_MIRROR_CONFIG, PolicyKind, RewriteSettings,
    SEARCH_AND_REPLACE_CONFIG, TABLE_LIST_CONFIG, load_entries, load_json, load_required,
    load_rewrite_settings,
};
pub use templates::{
    EXTERNAL_DATA_SOURCE_TEMPLATE, MASTER_ALTER_TABLE_TEMPLATE, MASTER_CREATE_SP_TEMPLATE,
    MASTER_KEY_TEMPLATE, SqlTemplates,
};
