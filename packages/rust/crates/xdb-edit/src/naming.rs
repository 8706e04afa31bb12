//! Naming policies: what a cross-database reference becomes.
//!
//! Two policies exist and both are plain data transformations:
//!
//! - [`NamingPolicy::SelfReference`] drops the qualifier from names that point
//!   at the file's own database (`[CITI_STATS]..[TB_X]` → `TB_X`).
//! - [`NamingPolicy::Mirror`] replaces the whole name with a generated mirror
//!   object name from a [`NamingTemplate`] (`mr_{0}__{2}` → `mr_CITI_STATS__TB_X`).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, TemplateError};
use crate::types::ObjectReference;

static TEMPLATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]")
        .unwrap_or_else(|err| panic!("invalid TEMPLATE_TOKEN regex: {err}"))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    DatabaseHint,
    Database,
    Object,
    Schema,
}

impl Field {
    fn from_placeholder(name: &str) -> Option<Self> {
        match name {
            "0" | "databaseHint" => Some(Self::DatabaseHint),
            "1" | "database" => Some(Self::Database),
            "2" | "object" => Some(Self::Object),
            "3" | "schema" => Some(Self::Schema),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A validated mirror-name template.
///
/// Placeholders: `{0}`/`{databaseHint}`, `{1}`/`{database}`, `{2}`/`{object}`,
/// `{3}`/`{schema}`. `{{` and `}}` are literal braces. Anything else is
/// rejected when the template is parsed, so rendering cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl NamingTemplate {
    /// Parse and validate a template.
    ///
    /// # Errors
    /// `Empty`, `UnknownPlaceholder` or `UnbalancedBrace`.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        if source.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in TEMPLATE_TOKEN.captures_iter(source) {
            let Some(token) = caps.get(0) else { continue };
            literal.push_str(&source[last..token.start()]);
            last = token.end();

            match token.as_str() {
                "{{" => literal.push('{'),
                "}}" => literal.push('}'),
                "{" | "}" => {
                    return Err(TemplateError::UnbalancedBrace(
                        token.start(),
                        source.to_string(),
                    ));
                }
                _ => {
                    let name = caps.get(1).map_or("", |m| m.as_str());
                    let field = Field::from_placeholder(name).ok_or_else(|| {
                        TemplateError::UnknownPlaceholder(name.to_string(), source.to_string())
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
            }
        }
        literal.push_str(&source[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Expand the template.
    #[must_use]
    pub fn render(&self, database_hint: &str, database: &str, object: &str, schema: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Field::DatabaseHint) => out.push_str(database_hint),
                Segment::Field(Field::Database) => out.push_str(database),
                Segment::Field(Field::Object) => out.push_str(object),
                Segment::Field(Field::Schema) => out.push_str(schema),
            }
        }
        out
    }
}

impl fmt::Display for NamingTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// How a matched reference is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingPolicy {
    /// Drop the qualifier of references to the file's own database.
    SelfReference,
    /// Replace every reference with a templated mirror object name.
    Mirror(NamingTemplate),
}

impl NamingPolicy {
    /// Policy name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelfReference => "self-reference",
            Self::Mirror(_) => "mirror",
        }
    }

    /// Replacement text for one reference, `None` to leave it as is.
    #[must_use]
    pub fn replacement(&self, database_hint: &str, reference: &ObjectReference) -> Option<String> {
        match self {
            Self::SelfReference => {
                if !reference.database.eq_ignore_ascii_case(database_hint) {
                    return None;
                }
                if reference.explicit_schema {
                    Some(format!("{}.{}", reference.schema, reference.object))
                } else {
                    Some(reference.object.clone())
                }
            }
            Self::Mirror(template) => Some(template.render(
                database_hint,
                &reference.database,
                &reference.object,
                &reference.schema,
            )),
        }
    }

    /// Rewrite a statement, replacing each reference span.
    ///
    /// `refs` must come from the same statement, in order.
    ///
    /// # Errors
    /// `NoSelfReference` when the policy left every reference untouched.
    pub fn rewrite_statement(
        &self,
        database_hint: &str,
        statement: &str,
        refs: &[ObjectReference],
    ) -> Result<String, ExtractError> {
        let mut out = String::with_capacity(statement.len());
        let mut last = 0;
        let mut replaced = 0;

        for reference in refs {
            if let Some(new_name) = self.replacement(database_hint, reference) {
                out.push_str(&statement[last..reference.span.start]);
                out.push_str(&new_name);
                last = reference.span.end;
                replaced += 1;
            }
        }
        out.push_str(&statement[last..]);

        if replaced == 0 {
            return Err(ExtractError::NoSelfReference(database_hint.to_string()));
        }
        Ok(out)
    }
}

/// What to do with lines holding more than one reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiReferencePolicy {
    /// Rewrite each reference with its own replacement.
    #[default]
    RewriteAll,
    /// Skip the line as `ParseFailed`.
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceExtractor;

    fn reference(stmt: &str) -> ObjectReference {
        ReferenceExtractor::new("CITI_")
            .expect("valid prefix")
            .extract_first(stmt)
            .expect("Should match")
    }

    #[test]
    fn test_mirror_positional() {
        let template = NamingTemplate::parse("mr_{0}__{2}").expect("valid template");
        assert_eq!(
            template.render("CITI_STATS", "CITI_STATS", "TB_X", "dbo"),
            "mr_CITI_STATS__TB_X"
        );
    }

    #[test]
    fn test_named_and_escaped() {
        let template =
            NamingTemplate::parse("{{{schema}}}.mr_{database}__{object}").expect("valid template");
        assert_eq!(template.render("h", "CITI_A", "T", "dbo"), "{dbo}.mr_CITI_A__T");
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        assert_eq!(
            NamingTemplate::parse("mr_{4}"),
            Err(TemplateError::UnknownPlaceholder(
                "4".to_string(),
                "mr_{4}".to_string()
            ))
        );
        assert!(matches!(
            NamingTemplate::parse("mr_{0:X}"),
            Err(TemplateError::UnknownPlaceholder(..))
        ));
    }

    #[test]
    fn test_unbalanced_rejected() {
        assert!(matches!(
            NamingTemplate::parse("mr_{0"),
            Err(TemplateError::UnbalancedBrace(3, _))
        ));
        assert!(matches!(
            NamingTemplate::parse("mr_0}"),
            Err(TemplateError::UnbalancedBrace(4, _))
        ));
        assert_eq!(NamingTemplate::parse(""), Err(TemplateError::Empty));
    }

    #[test]
    fn test_self_reference_strips_qualifier() {
        let stmt = "SELECT * FROM [CITI_STATS]..[TB_X]";
        let r = reference(stmt);
        let policy = NamingPolicy::SelfReference;
        assert_eq!(policy.replacement("CITI_STATS", &r).as_deref(), Some("TB_X"));
        assert_eq!(
            policy
                .rewrite_statement("CITI_STATS", stmt, &[r])
                .expect("Should rewrite"),
            "SELECT * FROM TB_X"
        );
    }

    #[test]
    fn test_self_reference_keeps_explicit_schema() {
        let r = reference("exec citi_stats.sales.p_run");
        assert_eq!(
            NamingPolicy::SelfReference
                .replacement("CITI_STATS", &r)
                .as_deref(),
            Some("sales.p_run")
        );
    }

    #[test]
    fn test_self_reference_ignores_other_databases() {
        let stmt = "FROM CITI_CORE..T";
        let r = reference(stmt);
        assert_eq!(NamingPolicy::SelfReference.replacement("CITI_STATS", &r), None);
        assert_eq!(
            NamingPolicy::SelfReference.rewrite_statement("CITI_STATS", stmt, &[r]),
            Err(ExtractError::NoSelfReference("CITI_STATS".to_string()))
        );
    }
}
