//! xdb: rewrite cross-database references ahead of an elastic pool migration.
//!
//! Configuration lives in `./config` (override with `--config-dir`); run
//! `xdb init` to create blank files.
//!
//! Logging: set `RUST_LOG=xdb_edit=debug` (or `warn`, `trace`) to tune logs on
//! stderr. The run summary goes to stdout.
//!
//! Exit codes: `0` done (skipped lines included), `2` the output script
//! already exists, `1` any other failure.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;
use xdb_cli::{
    EXTERNAL_DATA_SOURCE_CONFIG, GenerateError, GenerateReport, INITIAL_CONFIG, InitialConfig,
    MASTER_KEY_CONFIG, MASTER_MIRROR_CONFIG, PolicyKind, RewriteSettings, SqlTemplates,
    generate_external_data_sources, generate_from_template, generate_master_keys,
    generate_master_mirror, generate_sqlcmd_script, generate_table_list, load_entries,
    load_required, load_rewrite_settings, write_blank_configs,
};
use xdb_edit::{RewriteError, Rewriter, RunReport, ScriptStatus};

use crate::cli::{Cli, Command, GenerateArgs, RewriteArgs};

const DEFAULT_LOG_FILTER: &str = "xdb=info,xdb_cli=info,xdb_edit=info,xdb_io=warn";
const DEBUG_LOG_FILTER: &str = "xdb=debug,xdb_cli=debug,xdb_edit=debug,xdb_io=debug";
const TRACE_LOG_FILTER: &str = "xdb=trace,xdb_cli=trace,xdb_edit=trace,xdb_io=trace";

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG overrides; -v => debug, -vv => trace; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match cli.verbose {
            0 => DEFAULT_LOG_FILTER,
            1 => DEBUG_LOG_FILTER,
            _ => TRACE_LOG_FILTER,
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Selfref(args) => rewrite(cli, args, PolicyKind::SelfReference, None),
        Command::Mirrorref { args, template } => {
            rewrite(cli, args, PolicyKind::Mirror, template.as_deref())
        }
        Command::Sqlcmd {
            dir,
            server,
            dialect,
        } => {
            let settings = load_rewrite_settings(&cli.config_dir)?.merge(RewriteSettings {
                local_server: server.clone(),
                script_dialect: dialect.map(Into::into),
                ..RewriteSettings::default()
            });
            let path = generate_sqlcmd_script(
                dir,
                settings.local_server.as_deref().unwrap_or_default(),
                settings.script_dialect.unwrap_or_default(),
            )?;
            let report = GenerateReport {
                written: vec![path],
                skipped: Vec::new(),
            };
            print_generated(cli.json, &report)
        }
        Command::Keys(args) => {
            let path = cli.config_dir.join(MASTER_KEY_CONFIG);
            let entries = load_entries(&path)?;
            let report = generate_master_keys(entries, &templates(args)?, &args.out)
                .with_context(|| format!("generating master keys from {}", path.display()))?;
            print_generated(cli.json, &report)
        }
        Command::Sources(args) => {
            let path = cli.config_dir.join(EXTERNAL_DATA_SOURCE_CONFIG);
            let entries = load_entries(&path)?;
            let report = generate_external_data_sources(entries, &templates(args)?, &args.out)
                .with_context(|| format!("generating data sources from {}", path.display()))?;
            print_generated(cli.json, &report)
        }
        Command::Master(args) => {
            let path = cli.config_dir.join(MASTER_MIRROR_CONFIG);
            let entries = load_entries(&path)?;
            let report = generate_master_mirror(entries, &templates(args)?, &args.out)
                .with_context(|| format!("generating master scripts from {}", path.display()))?;
            print_generated(cli.json, &report)
        }
        Command::Config { out } => {
            let path = cli.config_dir.join(INITIAL_CONFIG);
            let config: InitialConfig = load_required(&path)?;
            let out = out.as_ref().unwrap_or(&cli.config_dir);
            let report = generate_table_list(&config, out)
                .with_context(|| format!("building the table list from {}", path.display()))?;
            print_generated(cli.json, &report)
        }
        Command::Template { template, out } => {
            let path = cli.config_dir.join(INITIAL_CONFIG);
            let fields = load_required(&path)?;
            let report = generate_from_template(template, fields, &SqlTemplates::builtin(), out)
                .with_context(|| format!("rendering {}", template.display()))?;
            print_generated(cli.json, &report)
        }
        Command::Init => {
            let report = write_blank_configs(&cli.config_dir)?;
            print_generated(cli.json, &report)
        }
    }
}

fn rewrite(
    cli: &Cli,
    args: &RewriteArgs,
    kind: PolicyKind,
    mirror_template: Option<&str>,
) -> Result<()> {
    let settings = load_rewrite_settings(&cli.config_dir)
        .context("loading rewrite settings")?
        .merge(args.overlay(mirror_template));
    let config = settings.resolve(&args.change_list, kind, args.dry_run)?;
    let report = Rewriter::new(config)?.run()?;
    print_report(cli.json, &report)?;

    if let ScriptStatus::Failed(reason) = &report.script {
        bail!("execution script not saved: {reason}");
    }
    Ok(())
}

fn templates(args: &GenerateArgs) -> Result<SqlTemplates, GenerateError> {
    match &args.templates {
        Some(dir) => SqlTemplates::with_overrides(dir),
        None => Ok(SqlTemplates::builtin()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(json: bool, report: &RunReport) -> Result<()> {
    if json {
        return print_json(report);
    }

    let summary = report.summary();
    println!(
        "applied: {}, already applied: {}, skipped: {}",
        summary.applied,
        summary.already_applied,
        summary.skipped()
    );
    for record in report.skipped() {
        println!(
            "  line {} {}: {}",
            record.list_line,
            record.outcome.label(),
            record.raw
        );
    }
    match &report.script {
        ScriptStatus::Written(path) => println!("script: {}", path.display()),
        ScriptStatus::Empty => println!("script: not written, no files touched"),
        ScriptStatus::DryRun => println!("script: not written, dry run"),
        ScriptStatus::Failed(reason) => println!("script: failed, {reason}"),
    }
    Ok(())
}

fn print_generated(json: bool, report: &GenerateReport) -> Result<()> {
    if json {
        return print_json(report);
    }
    for path in &report.written {
        println!("written: {}", path.display());
    }
    for path in &report.skipped {
        println!("exists:  {}", path.display());
    }
    Ok(())
}

/// `2` when a previous run's output script is in the way, else `1`.
fn exit_code(err: &anyhow::Error) -> u8 {
    let output_exists = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<RewriteError>(),
            Some(RewriteError::OutputExists(_))
        ) || matches!(
            cause.downcast_ref::<GenerateError>(),
            Some(GenerateError::OutputExists(_))
        )
    });
    if output_exists { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_exit_code_for_existing_output() {
        let err = anyhow::Error::from(RewriteError::OutputExists(PathBuf::from("refs.ps1")));
        assert_eq!(exit_code(&err), 2);

        let err = anyhow::Error::from(GenerateError::OutputExists(PathBuf::from("apply.ps1")))
            .context("sqlcmd");
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_exit_code_for_setup_errors() {
        assert_eq!(exit_code(&anyhow::Error::from(RewriteError::MissingServer)), 1);
        assert_eq!(
            exit_code(&anyhow::Error::from(RewriteError::ChangeListMissing(
                PathBuf::from("x.txt")
            ))),
            1
        );
    }
}
