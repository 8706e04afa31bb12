//! Change-list parsing.
//!
//! A change list is the output of a text search run from the root of the SQL
//! source tree, one match per line:
//!
//! ```text
//! ./citi_ip_country/dbo.GetCountry.UserDefinedFunction.sql:18:	from	citi_ip_country..tb_ip p
//! ```
//!
//! The first folder names the database the file belongs to. Lines that do not
//! fit are returned as errors next to the good ones; one bad line never stops
//! the batch.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::error::ChangeListError;
use crate::types::ChangeRequest;

static GREP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^(\./([^/:]+)/[^:]*):(\d*):(.*)$")
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|err| panic!("invalid GREP_LINE regex: {err}"))
});

/// One non-blank change-list line and what it parsed into.
#[derive(Debug, Clone)]
pub struct ChangeListEntry {
    /// Line number in the change list (1-based).
    pub list_line: usize,
    /// The line as read, minus a trailing `\r`.
    pub raw: String,
    /// The request, or why there is none.
    pub parsed: Result<ChangeRequest, ChangeListError>,
}

/// Parse a single change-list line.
///
/// `list_line` is only carried through for reporting.
///
/// # Errors
/// `Malformed` when the shape does not match, `LineNumber` for a missing or
/// zero line number, `EmptyStatement` when nothing follows the line number.
pub fn parse_line(list_line: usize, line: &str) -> Result<ChangeRequest, ChangeListError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let caps = GREP_LINE.captures(line).ok_or(ChangeListError::Malformed)?;

    let source_path = &caps[1];
    let database_hint = &caps[2];
    let number = &caps[3];
    let statement = &caps[4];

    let line_index = number
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| ChangeListError::LineNumber(number.to_string()))?;

    if statement.is_empty() {
        return Err(ChangeListError::EmptyStatement);
    }

    Ok(ChangeRequest {
        source_path: source_path.to_string(),
        database_hint: database_hint.to_string(),
        line_index,
        original_text: statement.to_string(),
        list_line,
    })
}

/// Parse a whole change list, skipping blank lines.
///
/// Entries keep the order of the input, which is the order edits must be
/// applied in.
#[must_use]
pub fn parse_change_list(text: &str) -> Vec<ChangeListEntry> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let list_line = idx + 1;
            ChangeListEntry {
                list_line,
                raw: line.strip_suffix('\r').unwrap_or(line).to_string(),
                parsed: parse_line(list_line, line),
            }
        })
        .collect()
}
