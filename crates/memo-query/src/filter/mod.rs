//! Typed filter expressions over note fields and content facts.
//!
//! A filter is compiled once with [`FilterParser::parse`] (or [`compile`])
//! and then evaluated against any number of notes with a
//! [`FilterEvaluator`]. Compilation resolves every name against a fixed
//! schema and checks every operator's operand types, so a filter that
//! compiles can only fail at evaluation time through arithmetic overflow
//! around `now()`.
//!
//! # Supported Syntax
//!
//! ## Fields
//! - `content` (string), `visibility` (`"PUBLIC"`, `"PROTECTED"`, `"PRIVATE"`)
//! - `creator_id` (int), `created_ts`, `updated_ts` (timestamps, seconds)
//! - `pinned`, `has_code`, `has_link`, `has_task_list`, `has_incomplete_tasks` (bool)
//! - `tags` (list of strings: manual tags plus `#tags` found in the content)
//!
//! ## Operators
//! - `&&`, `||`, `!`, `()` - boolean logic, short-circuit
//! - `==`, `!=`, `<`, `<=`, `>`, `>=` - comparison
//! - `+`, `-`, `*` - arithmetic on literals and `now()` only
//! - `"x" in tags`, `field in ["a", "b"]` - membership
//! - `content.contains("x")` - case-sensitive substring
//!
//! # Example
//!
//! ```
//! use memo_markdown_rs::Parser;
//! use memo_query_rs::filter::{compile, FilterEvaluator, FixedClock};
//! use memo_query_rs::{AnalyzedNote, Note};
//!
//! let filter = compile(r#"content.contains("test") && !pinned"#).unwrap();
//! let clock = FixedClock(0);
//! let evaluator = FilterEvaluator::new(&filter, &clock);
//!
//! let note = AnalyzedNote::analyze(Note::new(1, "a test note"), &Parser::default());
//! assert!(evaluator.matches(&note.attributes()));
//! ```

mod ast;
mod check;
mod error;
mod evaluator;
mod lexer;
mod parser;
mod schema;

pub use ast::{ArithOp, CmpOp, CompiledFilter, Expr, IntExpr};
pub use error::{CompileError, EvalError, FilterError, FilterResult};
pub use evaluator::{Clock, FilterEvaluator, FixedClock, SystemClock};
pub use lexer::{FilterToken, Lexer, LexerResult, PositionedToken};
pub use parser::{FilterParser, MAX_NESTING_DEPTH};
pub use schema::{Field, FieldType, VISIBILITY_VALUES};

/// Compiles a filter expression. Same as [`FilterParser::parse`].
pub fn compile(input: &str) -> FilterResult<CompiledFilter> {
    FilterParser::parse(input)
}
