//! The filter clause builder.
//!
//! Turns an ordered list of `(field, value, combinator)` terms into a
//! parameterized SQL predicate. Each term becomes a case-insensitive
//! contains match; terms chain strictly left to right using the combinator
//! attached to the *second and later* terms. There is no boolean operator
//! precedence: `A AND B OR C` means `(A AND B) OR C`.
//!
//! The first term's combinator is never applied. The search form emits one
//! for every field, including the first, for visual symmetry; with no
//! preceding clause to join it is a no-op and is ignored here.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::tables::Table;

/// AND/OR joiner attached to a filter field, applied relative to the
/// preceding accumulated predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    #[default]
    /// Both the accumulated predicate and this term must match.
    And,
    /// Either the accumulated predicate or this term must match.
    Or,
}

impl Combinator {
    fn sql(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

impl FromStr for Combinator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(Combinator::And),
            "OR" => Ok(Combinator::Or),
            other => Err(FilterError::UnknownCombinator {
                value: other.to_string(),
            }),
        }
    }
}

/// One field of a filter request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    /// Column name, validated against the table allow-list at build time.
    pub field: String,
    /// Raw search text; terms with blank values are skipped.
    pub value: String,
    /// Joiner against the predicate accumulated so far.
    pub combinator: Combinator,
}

impl FilterTerm {
    /// Convenience constructor.
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        combinator: Combinator,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            combinator,
        }
    }
}

/// An ordered multi-field filter request.
///
/// Term order is significant: it is either the client's explicit field
/// ordering or the natural key order of the filter mapping it sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    terms: Vec<FilterTerm>,
}

/// A built predicate: SQL text with `?n` placeholders plus the values to
/// bind, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    /// Predicate text without the leading `WHERE`.
    pub clause: String,
    /// Bound parameter values, one per placeholder.
    pub params: Vec<String>,
}

impl FilterSpec {
    /// Creates an empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter from ordered terms.
    pub fn from_terms(terms: Vec<FilterTerm>) -> Self {
        Self { terms }
    }

    /// Appends a term, preserving order.
    pub fn push(&mut self, term: FilterTerm) {
        self.terms.push(term);
    }

    /// The ordered terms.
    pub fn terms(&self) -> &[FilterTerm] {
        &self.terms
    }

    /// Builds the predicate for `table`, or `None` when every term has a
    /// blank value (full-table semantics).
    ///
    /// Field names are resolved against the table's column allow-list
    /// before any SQL text is produced; an unknown field fails the whole
    /// build.
    pub fn build(&self, table: Table) -> Result<Option<SqlFilter>, FilterError> {
        let mut clause = String::new();
        let mut params: Vec<String> = Vec::new();

        for term in &self.terms {
            // Validate even skipped fields so a bad field name never
            // passes silently just because its value was blank.
            let column = table.resolve_column(&term.field)?;

            let value = term.value.trim();
            if value.is_empty() {
                continue;
            }

            if !clause.is_empty() {
                clause.push(' ');
                clause.push_str(term.combinator.sql());
                clause.push(' ');
            }
            params.push(format!("%{}%", escape_like(value)));
            clause.push_str(&format!(
                "{} LIKE ?{} ESCAPE '\\'",
                column,
                params.len()
            ));
        }

        if clause.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SqlFilter { clause, params }))
        }
    }
}

/// Escapes LIKE wildcards in a bound value so user text matches literally.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
