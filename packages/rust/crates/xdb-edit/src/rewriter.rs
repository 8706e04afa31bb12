//! The batch rewriter: change list in, edited files and execution script out.
//!
//! Setup is checked up front (change list present, server configured, no
//! script left over from a previous run). After that nothing aborts the
//! batch: every change-list line ends in exactly one [`EditOutcome`], logged
//! and kept in the [`RunReport`].

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};
use xdb_io::{IoError, read_text_safe};

use crate::change_list::{ChangeListEntry, parse_change_list};
use crate::config::RewriteConfig;
use crate::editor::LineEditor;
use crate::error::{ExtractError, RewriteError, ScriptError};
use crate::ledger::{TouchedFile, TouchedFileLedger};
use crate::naming::MultiReferencePolicy;
use crate::reference::ReferenceExtractor;
use crate::script::BatchScriptEmitter;
use crate::types::EditOutcome;

/// What happened to one change-list line.
#[derive(Debug, Clone, Serialize)]
pub struct LineRecord {
    /// Line number in the change list (1-based).
    pub list_line: usize,
    /// The change-list line as read.
    pub raw: String,
    /// Resolved SQL file, when the line parsed.
    pub path: Option<PathBuf>,
    /// Statement after rewriting, when one was computed.
    pub rewritten: Option<String>,
    /// Outcome of the line.
    pub outcome: EditOutcome,
}

/// What happened to the execution script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ScriptStatus {
    /// Written to this path.
    Written(PathBuf),
    /// Not written: no file was touched.
    Empty,
    /// Not written: dry run.
    DryRun,
    /// Writing failed.
    Failed(String),
}

/// Result of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// One record per non-blank change-list line, in order.
    pub records: Vec<LineRecord>,
    /// Files included in the execution script.
    pub touched: Vec<TouchedFile>,
    /// Execution script status.
    pub script: ScriptStatus,
}

/// Outcome counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// `Applied` lines.
    pub applied: usize,
    /// `AlreadyApplied` lines.
    pub already_applied: usize,
    /// `Mismatched` lines.
    pub mismatched: usize,
    /// `OutOfBounds` lines.
    pub out_of_bounds: usize,
    /// `ParseFailed` lines.
    pub parse_failed: usize,
    /// `IoFailed` lines.
    pub io_failed: usize,
}

impl RunSummary {
    /// Lines skipped for any reason.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.mismatched + self.out_of_bounds + self.parse_failed + self.io_failed
    }
}

impl RunReport {
    /// Count outcomes.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for record in &self.records {
            match record.outcome {
                EditOutcome::Applied => summary.applied += 1,
                EditOutcome::AlreadyApplied => summary.already_applied += 1,
                EditOutcome::Mismatched { .. } => summary.mismatched += 1,
                EditOutcome::OutOfBounds { .. } => summary.out_of_bounds += 1,
                EditOutcome::ParseFailed { .. } => summary.parse_failed += 1,
                EditOutcome::IoFailed { .. } => summary.io_failed += 1,
            }
        }
        summary
    }

    /// Records whose line was skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &LineRecord> {
        self.records
            .iter()
            .filter(|record| !record.outcome.touches_file())
    }
}

/// Runs a change list through extraction, naming, editing and emission.
#[derive(Debug)]
pub struct Rewriter {
    config: RewriteConfig,
    root: PathBuf,
    script_path: PathBuf,
    extractor: ReferenceExtractor,
    editor: LineEditor,
    emitter: BatchScriptEmitter,
}

impl Rewriter {
    /// Validate setup and build the pipeline.
    ///
    /// # Errors
    /// `ChangeListMissing`, `MissingServer`, `OutputExists` (not checked in
    /// dry-run mode), `Prefix`, or `Io` if the root cannot be made absolute.
    pub fn new(config: RewriteConfig) -> Result<Self, RewriteError> {
        if !config.change_list.is_file() {
            return Err(RewriteError::ChangeListMissing(config.change_list.clone()));
        }
        if config.server.trim().is_empty() {
            return Err(RewriteError::MissingServer);
        }

        let script_path = config.script_path();
        if !config.dry_run && script_path.exists() {
            return Err(RewriteError::OutputExists(script_path));
        }

        let root = std::path::absolute(config.root()).map_err(IoError::System)?;
        let extractor = ReferenceExtractor::new(&config.database_prefix)?;
        let editor = LineEditor::new(root.clone())
            .with_max_file_size(config.max_file_size)
            .with_dry_run(config.dry_run);
        let emitter = BatchScriptEmitter::new(config.server.trim(), config.dialect);

        Ok(Self {
            config,
            root,
            script_path,
            extractor,
            editor,
            emitter,
        })
    }

    /// Process the whole change list, then emit the execution script.
    ///
    /// # Errors
    /// Only if the change list cannot be read; per-line problems are
    /// reported in the returned [`RunReport`].
    pub fn run(&self) -> Result<RunReport, RewriteError> {
        let text = read_text_safe(&self.config.change_list, self.config.max_file_size)?;
        let entries = parse_change_list(&text);
        info!(
            change_list = %self.config.change_list.display(),
            lines = entries.len(),
            policy = self.config.policy.name(),
            dry_run = self.config.dry_run,
            "processing change list"
        );

        let mut ledger = TouchedFileLedger::new();
        let records: Vec<LineRecord> = entries
            .into_iter()
            .map(|entry| self.process(entry, &mut ledger))
            .collect();

        let script = self.emit(&ledger);
        Ok(RunReport {
            records,
            touched: ledger.into_entries(),
            script,
        })
    }

    /// Process one change-list entry, registering touched files.
    pub fn process(&self, entry: ChangeListEntry, ledger: &mut TouchedFileLedger) -> LineRecord {
        let ChangeListEntry {
            list_line,
            raw,
            parsed,
        } = entry;

        let mut record = LineRecord {
            list_line,
            raw,
            path: None,
            rewritten: None,
            outcome: EditOutcome::Applied,
        };

        let request = match parsed {
            Ok(request) => request,
            Err(e) => {
                record.outcome = EditOutcome::ParseFailed {
                    reason: e.to_string(),
                };
                report_skip(&record);
                return record;
            }
        };

        let path = match self.editor.resolve(&request.source_path) {
            Ok(path) => path,
            Err(e) => {
                record.outcome = EditOutcome::ParseFailed {
                    reason: e.to_string(),
                };
                report_skip(&record);
                return record;
            }
        };
        record.path = Some(path.clone());

        let new_text = match self.rewrite(&request.database_hint, &request.original_text) {
            Ok(text) => text,
            Err(e) => {
                record.outcome = EditOutcome::ParseFailed {
                    reason: e.to_string(),
                };
                report_skip(&record);
                return record;
            }
        };

        info!(
            list_line,
            path = %path.display(),
            line = request.line_index + 1,
            original = %request.original_text,
            rewritten = %new_text,
            "edit"
        );

        record.outcome = self.editor.apply(&path, &request, &new_text);
        record.rewritten = Some(new_text);

        match record.outcome {
            EditOutcome::Applied => ledger.record(&path, &request.database_hint, true),
            EditOutcome::AlreadyApplied => {
                info!(list_line, path = %path.display(), "already modified");
                ledger.record(&path, &request.database_hint, false);
            }
            _ => report_skip(&record),
        }
        record
    }

    /// Rewrite a statement under the configured policy.
    ///
    /// # Errors
    /// Any [`ExtractError`]: no reference, incomplete reference, rejected
    /// multi-reference line, or no self-reference.
    pub fn rewrite(&self, database_hint: &str, statement: &str) -> Result<String, ExtractError> {
        let refs = self.extractor.extract_all(statement)?;
        if refs.len() > 1 && self.config.multi_reference == MultiReferencePolicy::Reject {
            return Err(ExtractError::MultipleReferences(refs.len()));
        }
        self.config
            .policy
            .rewrite_statement(database_hint, statement, &refs)
    }

    fn emit(&self, ledger: &TouchedFileLedger) -> ScriptStatus {
        if self.config.dry_run {
            return ScriptStatus::DryRun;
        }
        let entries = BatchScriptEmitter::ledger_entries(&self.root, ledger.entries());
        match self.emitter.write(&self.script_path, &entries) {
            Ok(()) => ScriptStatus::Written(self.script_path.clone()),
            Err(ScriptError::Empty) => {
                warn!("no files matched, execution script not written");
                ScriptStatus::Empty
            }
            Err(e) => {
                warn!(path = %self.script_path.display(), error = %e, "cannot save execution script");
                ScriptStatus::Failed(e.to_string())
            }
        }
    }
}

fn report_skip(record: &LineRecord) {
    let reason = match &record.outcome {
        EditOutcome::Mismatched { found } => format!("line mismatch in the SQL file, found `{found}`"),
        EditOutcome::OutOfBounds { line_count } => {
            format!("line is out of bounds, file has {line_count} lines")
        }
        EditOutcome::ParseFailed { reason } | EditOutcome::IoFailed { reason } => reason.clone(),
        EditOutcome::Applied | EditOutcome::AlreadyApplied => return,
    };
    warn!(
        list_line = record.list_line,
        input = %record.raw,
        outcome = record.outcome.label(),
        "skipped: {reason}"
    );
}
