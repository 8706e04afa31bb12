#![allow(clippy::doc_markdown)]

//! xdb-io - Line-preserving text I/O for the cross-database rewriter
//!
//! SQL sources touched by the rewriter are edited one line at a time. Every
//! byte outside the edited line must survive the round trip, so files are
//! loaded into a [`TextFile`] that remembers its BOM, line-ending style and
//! final newline.
//!
//! # Features
//!
//! - **Safety**: Binary detection, strict UTF-8 for edited files & Size limits
//! - **Fidelity**: BOM, LF/CRLF and trailing newline are written back as found
//! - **Write-once**: [`write_new`] never clobbers an existing file
//!
//! # Architecture
//!
//! ```text
//! xdb-io/src/
//! ├── lib.rs      # Re-exports (this file)
//! ├── error.rs    # IoError enum
//! ├── detect.rs   # Binary detection & decoding
//! ├── text.rs     # TextFile line model
//! └── sync.rs     # Read / write API
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use xdb_io::{read_text_file, write_text_file};
//!
//! let mut file = read_text_file("citi_stats/dbo.Proc.sql", 8 * 1024 * 1024)?;
//! file.replace_line(17, "FROM TB_X");
//! write_text_file("citi_stats/dbo.Proc.sql", &file)?;
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod detect;
mod error;
mod sync;
mod text;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use error::IoError;
pub use sync::{read_text_file, read_text_safe, write_new, write_text_file};
pub use text::TextFile;

pub use detect::{decode_buffer, decode_buffer_lossy, is_binary};

/// Default size limit for SQL sources (8 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 8 * 1024 * 1024;
