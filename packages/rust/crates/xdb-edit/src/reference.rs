//! Three-part name extraction.
//!
//! Finds `database.schema.object` names whose database follows the tenant
//! prefix convention (e.g. `CITI_`). Every part may be bracket-quoted and the
//! schema may be empty (`[CITI_STATS]..[TB_X]`), in which case it is `dbo`.

use regex::{Regex, RegexBuilder};

use crate::error::ExtractError;
use crate::types::ObjectReference;

/// Schema assumed for `db..object` names.
pub const DEFAULT_SCHEMA: &str = "dbo";

/// Locates three-part references in statement text.
#[derive(Debug, Clone)]
pub struct ReferenceExtractor {
    prefix: String,
    pattern: Regex,
}

impl ReferenceExtractor {
    /// Build an extractor for database names starting with `prefix`.
    ///
    /// Matching is case-insensitive.
    ///
    /// # Errors
    /// Only if the escaped prefix exceeds the regex size limit.
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        // A word-initial prefix must not match inside a longer identifier.
        let boundary = if prefix.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
            r"\b"
        } else {
            ""
        };
        let source = format!(
            r"\[?{boundary}({}\w*)\]?\.\[?(\w*)\]?\.\[?(\w*)\]?",
            regex::escape(prefix)
        );
        let pattern = RegexBuilder::new(&source).case_insensitive(true).build()?;
        Ok(Self {
            prefix: prefix.to_string(),
            pattern,
        })
    }

    /// The database prefix this extractor looks for.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Every reference in the statement, left to right.
    ///
    /// # Errors
    /// `NoReference` when nothing matches, `Incomplete` when a match has an
    /// empty database or object part. One incomplete match fails the whole
    /// statement, complete matches included.
    pub fn extract_all(&self, statement: &str) -> Result<Vec<ObjectReference>, ExtractError> {
        let mut refs = Vec::new();
        for caps in self.pattern.captures_iter(statement) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let database = caps.get(1).map_or("", |m| m.as_str());
            let schema = caps.get(2).map_or("", |m| m.as_str());
            let object = caps.get(3).map_or("", |m| m.as_str());

            if database.is_empty() || object.is_empty() {
                return Err(ExtractError::Incomplete(statement[whole].to_string()));
            }

            refs.push(ObjectReference {
                database: database.to_string(),
                schema: if schema.is_empty() {
                    DEFAULT_SCHEMA.to_string()
                } else {
                    schema.to_string()
                },
                object: object.to_string(),
                explicit_schema: !schema.is_empty(),
                span: whole,
            });
        }

        if refs.is_empty() {
            return Err(ExtractError::NoReference(self.prefix.clone()));
        }
        Ok(refs)
    }

    /// The first reference in the statement.
    ///
    /// # Errors
    /// Same as [`Self::extract_all`].
    pub fn extract_first(&self, statement: &str) -> Result<ObjectReference, ExtractError> {
        self.extract_all(statement)
            .map(|refs| refs.into_iter().next())?
            .ok_or_else(|| ExtractError::NoReference(self.prefix.clone()))
    }
}
