//! Filter evaluation against analyzed notes.
//!
//! This module provides the [`FilterEvaluator`] for running a compiled filter
//! against the attributes of one note at a time, and the [`Clock`] that
//! supplies `now()`.
//!
//! # Example
//!
//! ```
//! use memo_markdown_rs::Parser;
//! use memo_query_rs::filter::{FilterEvaluator, FilterParser, FixedClock};
//! use memo_query_rs::{AnalyzedNote, Note};
//!
//! let filter = FilterParser::parse("has_incomplete_tasks && created_ts > now() - 3600").unwrap();
//! let clock = FixedClock(10_000);
//!
//! let mut note = Note::new(1, "- [ ] call back");
//! note.created_ts = 9_000;
//! let note = AnalyzedNote::analyze(note, &Parser::default());
//!
//! let evaluator = FilterEvaluator::new(&filter, &clock);
//! assert!(evaluator.matches(&note.attributes()));
//! ```

use super::ast::{CmpOp, CompiledFilter, Expr, IntExpr};
use super::check::apply_arith;
use super::error::EvalError;
use super::schema::Field;
use crate::{AnalyzedNote, NoteAttributes};

/// Source of the current time for `now()`.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock frozen at a fixed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Evaluates a compiled filter against notes.
///
/// Holds no per-note state, so one evaluator can be shared by threads that
/// each evaluate a slice of notes.
pub struct FilterEvaluator<'a> {
    filter: &'a CompiledFilter,
    clock: &'a dyn Clock,
    reads_clock: bool,
}

impl std::fmt::Debug for FilterEvaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEvaluator")
            .field("filter", &self.filter.source())
            .field("reads_clock", &self.reads_clock)
            .finish()
    }
}

impl<'a> FilterEvaluator<'a> {
    /// Creates a new filter evaluator.
    ///
    /// # Arguments
    ///
    /// * `filter` - The compiled filter to evaluate
    /// * `clock` - The clock `now()` reads
    pub fn new(filter: &'a CompiledFilter, clock: &'a dyn Clock) -> Self {
        Self {
            filter,
            clock,
            reads_clock: filter.expr().uses_now(),
        }
    }

    /// Evaluates the filter against one note.
    ///
    /// The clock is read at most once per call.
    pub fn try_matches(&self, attrs: &NoteAttributes<'_>) -> Result<bool, EvalError> {
        let now = if self.reads_clock { self.clock.now() } else { 0 };
        Evaluation { attrs, now }.predicate(self.filter.expr())
    }

    /// Returns true if the note matches.
    ///
    /// Evaluation errors count as a non-match and are logged.
    pub fn matches(&self, attrs: &NoteAttributes<'_>) -> bool {
        match self.try_matches(attrs) {
            Ok(matched) => matched,
            Err(err) => {
                log::warn!(
                    "filter {:?} failed on note {}: {err}",
                    self.filter.source(),
                    attrs.id()
                );
                false
            }
        }
    }

    /// Filters a slice of notes, returning only those that match.
    pub fn filter_notes<'b>(&self, notes: &'b [AnalyzedNote]) -> Vec<&'b AnalyzedNote> {
        notes
            .iter()
            .filter(|note| self.matches(&note.attributes()))
            .collect()
    }
}

/// State of one evaluation: the note and the clock reading.
struct Evaluation<'n, 'a> {
    attrs: &'n NoteAttributes<'a>,
    now: i64,
}

impl Evaluation<'_, '_> {
    fn predicate(&self, expr: &Expr) -> Result<bool, EvalError> {
        let attrs = self.attrs;
        Ok(match expr {
            Expr::Const { value } => *value,
            Expr::Flag { field } => self.flag(*field)?,
            Expr::FlagEquals { left, right } => self.flag(*left)? == self.flag(*right)?,
            Expr::Compare { op, left, right } => self.compare(*op, left, right)?,
            Expr::ContentEquals { value } => attrs.content() == value,
            Expr::ContentContains { needle } => attrs.content().contains(needle.as_str()),
            Expr::ContentIn { values } => values.iter().any(|v| v == attrs.content()),
            Expr::VisibilityIn { values } => values.contains(&attrs.visibility()),
            Expr::IntIn { field, values } => values.contains(&self.integer(*field)?),
            Expr::HasTag { name } => attrs.has_tag(name),
            Expr::Not { operand } => !self.predicate(operand)?,
            Expr::All { operands } => {
                for operand in operands {
                    if !self.predicate(operand)? {
                        return Ok(false);
                    }
                }
                true
            }
            Expr::Any { operands } => {
                for operand in operands {
                    if self.predicate(operand)? {
                        return Ok(true);
                    }
                }
                false
            }
        })
    }

    fn compare(&self, op: CmpOp, left: &IntExpr, right: &IntExpr) -> Result<bool, EvalError> {
        Ok(op.apply(self.term(left)?, self.term(right)?))
    }

    fn term(&self, term: &IntExpr) -> Result<i64, EvalError> {
        match term {
            IntExpr::Field { field } => self.integer(*field),
            IntExpr::Const { value } => Ok(*value),
            IntExpr::Now => Ok(self.now),
            IntExpr::Neg { operand } => self.term(operand)?.checked_neg().ok_or(EvalError::Overflow),
            IntExpr::Arith { op, left, right } => {
                apply_arith(*op, self.term(left)?, self.term(right)?).ok_or(EvalError::Overflow)
            }
        }
    }

    fn flag(&self, field: Field) -> Result<bool, EvalError> {
        self.attrs
            .flag(field)
            .ok_or(EvalError::WrongFieldType { field })
    }

    fn integer(&self, field: Field) -> Result<i64, EvalError> {
        self.attrs
            .integer(field)
            .ok_or(EvalError::WrongFieldType { field })
    }
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
