//! Inline diff for a rewritten line.
//!
//! Uses the `similar` crate at word granularity, which is what matters for a
//! single-line qualifier change.

use similar::{ChangeTag, TextDiff};

/// Render the change between two versions of one line.
///
/// Removed words are shown as `[-old-]`, inserted words as `{+new+}`.
#[must_use]
pub fn generate_inline_diff(original: &str, modified: &str) -> String {
    let diff = TextDiff::from_words(original, modified);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Equal => output.push_str(change.value()),
            ChangeTag::Delete => {
                output.push_str("[-");
                output.push_str(change.value());
                output.push_str("-]");
            }
            ChangeTag::Insert => {
                output.push_str("{+");
                output.push_str(change.value());
                output.push_str("+}");
            }
        }
    }

    output
}
