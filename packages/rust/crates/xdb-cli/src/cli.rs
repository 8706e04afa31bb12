use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use xdb_cli::{DEFAULT_CONFIG_DIR, RewriteSettings};
use xdb_edit::{MultiReferencePolicy, ScriptDialect};

#[derive(Parser, Debug)]
#[command(
    name = "xdb",
    version,
    about = "Rewrite cross-database references for an Azure SQL elastic pool migration",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Directory holding the JSON configuration files.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CONFIG_DIR, global = true)]
    pub(crate) config_dir: PathBuf,

    /// Raise log verbosity (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    /// Print the report as JSON on stdout.
    #[arg(long, global = true)]
    pub(crate) json: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DialectArg {
    Powershell,
    Cmd,
}

impl From<DialectArg> for ScriptDialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Powershell => Self::PowerShell,
            DialectArg::Cmd => Self::Cmd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum MultiReferenceArg {
    RewriteAll,
    Reject,
}

impl From<MultiReferenceArg> for MultiReferencePolicy {
    fn from(arg: MultiReferenceArg) -> Self {
        match arg {
            MultiReferenceArg::RewriteAll => Self::RewriteAll,
            MultiReferenceArg::Reject => Self::Reject,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct RewriteArgs {
    /// Grep output (`./<db>/<file>:<line>:<text>`) in the root of the SQL tree.
    #[arg(value_name = "CHANGE_LIST")]
    pub(crate) change_list: PathBuf,

    /// Server for the execution script (overrides `localServer`).
    #[arg(long)]
    pub(crate) server: Option<String>,

    /// Database name prefix (default: CITI_).
    #[arg(long)]
    pub(crate) prefix: Option<String>,

    /// Execution script flavour (default: powershell).
    #[arg(long, value_enum)]
    pub(crate) dialect: Option<DialectArg>,

    /// Lines with several references (default: rewrite-all).
    #[arg(long, value_enum)]
    pub(crate) multi_reference: Option<MultiReferenceArg>,

    /// Report outcomes without writing anything.
    #[arg(long, default_value_t = false)]
    pub(crate) dry_run: bool,
}

impl RewriteArgs {
    /// The command-line settings layer.
    pub(crate) fn overlay(&self, mirror_template: Option<&str>) -> RewriteSettings {
        RewriteSettings {
            local_server: self.server.clone(),
            database_prefix: self.prefix.clone(),
            mirror_template: mirror_template.map(str::to_string),
            script_dialect: self.dialect.map(Into::into),
            multi_reference: self.multi_reference.map(Into::into),
            max_file_size: None,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct GenerateArgs {
    /// Directory with template overrides.
    #[arg(long, value_name = "DIR")]
    pub(crate) templates: Option<PathBuf>,

    /// Output directory.
    #[arg(long, value_name = "DIR", default_value = "scripts")]
    pub(crate) out: PathBuf,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Remove database qualifiers from references to the file's own database.
    Selfref(RewriteArgs),
    /// Replace cross-database references with mirror object names.
    #[command(alias = "insertref")]
    Mirrorref {
        #[command(flatten)]
        args: RewriteArgs,

        /// Mirror naming template, e.g. `mr_{1}__{2}` (overrides `mirrorTemplate`).
        #[arg(long)]
        template: Option<String>,
    },
    /// Write an apply script running every .sql file of a directory.
    Sqlcmd {
        /// Directory holding the .sql files.
        dir: PathBuf,

        /// Server for the script (overrides `localServer`).
        #[arg(long)]
        server: Option<String>,

        /// Script flavour (default: powershell).
        #[arg(long, value_enum)]
        dialect: Option<DialectArg>,
    },
    /// Render CREATE MASTER KEY scripts from MasterKeyConfig.json.
    Keys(GenerateArgs),
    /// Render CREATE EXTERNAL DATA SOURCE scripts from ExternalDataSourceConfig.json.
    Sources(GenerateArgs),
    /// Render master table and procedure scripts from MasterMirrorConfig.json.
    Master(GenerateArgs),
    /// Build TableList.json from the `masterTables` of config.json.
    Config {
        /// Output directory (default: the config directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Render any template file with the fields of config.json.
    Template {
        /// Template file; placeholders are config.json field names, e.g. `{{ mirrorDB }}`.
        template: PathBuf,

        /// Output directory.
        #[arg(long, value_name = "DIR", default_value = "scripts")]
        out: PathBuf,
    },
    /// Write blank configuration files.
    Init,
}
