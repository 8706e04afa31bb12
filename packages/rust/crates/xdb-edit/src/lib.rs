#![allow(clippy::doc_markdown)]

//! xdb-edit - Grep-driven rewriting of cross-database references
//!
//! Moving SQL Server databases into an elastic pool removes cross-database
//! joins. Every `database.schema.object` name in the T-SQL sources must either
//! lose its qualifier (self-references) or point at a mirror object. This
//! crate takes a grep-style change list of the lines to fix, rewrites each
//! line in place after checking it still says what the change list saw, and
//! emits a `sqlcmd` script to re-run the touched files.
//!
//! # Pipeline
//!
//! ```text
//! change list ─▶ parse_change_list ─▶ ReferenceExtractor ─▶ NamingPolicy
//!                                                              │
//!                   BatchScriptEmitter ◀─ TouchedFileLedger ◀─ LineEditor
//! ```
//!
//! # Architecture
//!
//! ```text
//! xdb-edit/src/
//! ├── lib.rs          # Re-exports (this file)
//! ├── error.rs        # Error enums (thiserror)
//! ├── types.rs        # ChangeRequest, ObjectReference, EditOutcome
//! ├── change_list.rs  # Grep line parsing
//! ├── reference.rs    # Three-part name extraction
//! ├── naming.rs       # NamingPolicy, NamingTemplate
//! ├── diff.rs         # Inline diff for logs
//! ├── editor.rs       # LineEditor
//! ├── ledger.rs       # TouchedFileLedger
//! ├── script.rs       # BatchScriptEmitter
//! ├── config.rs       # RewriteConfig
//! └── rewriter.rs     # Rewriter, RunReport
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use xdb_edit::{NamingPolicy, NamingTemplate, RewriteConfig, Rewriter};
//!
//! let policy = NamingPolicy::Mirror(NamingTemplate::parse("mr_{0}__{2}")?);
//! let config = RewriteConfig::new("src/insertrefs.txt", "sql01", policy);
//! let report = Rewriter::new(config)?.run()?;
//! println!("{:?}", report.summary());
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod change_list;
mod config;
mod diff;
mod editor;
mod error;
mod ledger;
mod naming;
mod reference;
mod rewriter;
mod script;
mod types;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use change_list::{ChangeListEntry, parse_change_list, parse_line};
pub use config::{DEFAULT_DATABASE_PREFIX, RewriteConfig};
pub use diff::generate_inline_diff;
pub use editor::LineEditor;
pub use error::{ChangeListError, ExtractError, RewriteError, ScriptError, TemplateError};
pub use ledger::{TouchedFile, TouchedFileLedger};
pub use naming::{MultiReferencePolicy, NamingPolicy, NamingTemplate};
pub use reference::{DEFAULT_SCHEMA, ReferenceExtractor};
pub use rewriter::{LineRecord, RunReport, RunSummary, Rewriter, ScriptStatus};
pub use script::{BatchScriptEmitter, ScriptDialect, ScriptEntry};
pub use types::{ChangeRequest, EditOutcome, ObjectReference};
