//! Syntax tree and typed expression tree for filter expressions.
//!
//! The parser produces an untyped [`Syntax`] tree. The checker resolves field
//! names against the schema and turns it into a typed [`Expr`], which is what
//! the evaluator runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::schema::Field;
use crate::Visibility;

// ==================== Untyped Syntax ====================

/// A literal value as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Literal {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Str(value) => write!(f, "{value:?}"),
            Literal::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl CmpOp {
    /// Returns true for `==` and `!=`.
    pub fn is_equality(self) -> bool {
        matches!(self, CmpOp::Eq | CmpOp::NotEq)
    }

    /// Applies the operator to two ordered values.
    pub fn apply<T: Ord>(self, left: T, right: T) -> bool {
        match self {
            CmpOp::Eq => left == right,
            CmpOp::NotEq => left != right,
            CmpOp::Less => left < right,
            CmpOp::LessEq => left <= right,
            CmpOp::Greater => left > right,
            CmpOp::GreaterEq => left >= right,
        }
    }

    /// The operator with its operands swapped (`a < b` is `b > a`).
    pub fn flipped(self) -> CmpOp {
        match self {
            CmpOp::Less => CmpOp::Greater,
            CmpOp::LessEq => CmpOp::GreaterEq,
            CmpOp::Greater => CmpOp::Less,
            CmpOp::GreaterEq => CmpOp::LessEq,
            other => other,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Less => "<",
            CmpOp::LessEq => "<=",
            CmpOp::Greater => ">",
            CmpOp::GreaterEq => ">=",
        })
    }
}

/// Untyped parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Syntax {
    Literal(Literal),
    Ident(String),
    /// `name()`
    Call(String),
    /// `receiver.name(args)`
    Method {
        receiver: Box<Syntax>,
        name: String,
        args: Vec<Syntax>,
    },
    List(Vec<Literal>),
    Not(Box<Syntax>),
    Neg(Box<Syntax>),
    /// Flattened `&&` chain.
    And(Vec<Syntax>),
    /// Flattened `||` chain.
    Or(Vec<Syntax>),
    Arith {
        op: ArithOp,
        left: Box<Syntax>,
        right: Box<Syntax>,
    },
    Compare {
        op: CmpOp,
        left: Box<Syntax>,
        right: Box<Syntax>,
    },
    In {
        needle: Box<Syntax>,
        haystack: Box<Syntax>,
    },
}

impl Syntax {
    /// Short description used in type errors.
    pub(crate) fn describe(&self) -> String {
        match self {
            Syntax::Literal(literal) => format!("literal {literal}"),
            Syntax::Ident(name) => format!("'{name}'"),
            Syntax::Call(name) => format!("{name}()"),
            Syntax::Method { name, .. } => format!("method {name}()"),
            Syntax::List(_) => "a list".to_string(),
            Syntax::Not(_) | Syntax::And(_) | Syntax::Or(_) => "a boolean expression".to_string(),
            Syntax::Compare { .. } | Syntax::In { .. } => "a comparison".to_string(),
            Syntax::Neg(_) | Syntax::Arith { .. } => "an arithmetic expression".to_string(),
        }
    }
}

// ==================== Typed Expressions ====================

/// An integer-valued term: a field, or a constant expression over literals
/// and `now()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntExpr {
    /// An integer or timestamp field.
    Field { field: Field },
    /// A folded constant.
    Const { value: i64 },
    /// The clock reading at evaluation time.
    Now,
    /// Negation.
    Neg { operand: Box<IntExpr> },
    /// Binary arithmetic.
    Arith {
        op: ArithOp,
        left: Box<IntExpr>,
        right: Box<IntExpr>,
    },
}

/// A typed boolean predicate over one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    /// `true` / `false`.
    Const { value: bool },
    /// A boolean field.
    Flag { field: Field },
    /// Two boolean fields compared with `==`.
    FlagEquals { left: Field, right: Field },
    /// Integer comparison.
    Compare {
        op: CmpOp,
        left: IntExpr,
        right: IntExpr,
    },
    /// `content == "..."`.
    ContentEquals { value: String },
    /// `content.contains("...")`, case-sensitive.
    ContentContains { needle: String },
    /// `content in [...]`.
    ContentIn { values: Vec<String> },
    /// `visibility == ...` or `visibility in [...]`.
    VisibilityIn { values: Vec<Visibility> },
    /// `creator_id in [...]` and friends.
    IntIn { field: Field, values: Vec<i64> },
    /// `"name" in tags`.
    HasTag { name: String },
    /// Logical NOT.
    Not { operand: Box<Expr> },
    /// Logical AND, short-circuit, left to right.
    All { operands: Vec<Expr> },
    /// Logical OR, short-circuit, left to right.
    Any { operands: Vec<Expr> },
}

impl Expr {
    /// Creates a NOT expression.
    pub fn negate(inner: Expr) -> Self {
        Expr::Not {
            operand: Box::new(inner),
        }
    }

    /// Returns true if the expression reads the clock.
    pub fn uses_now(&self) -> bool {
        match self {
            Expr::Compare { left, right, .. } => left.uses_now() || right.uses_now(),
            Expr::Not { operand } => operand.uses_now(),
            Expr::All { operands } | Expr::Any { operands } => operands.iter().any(Expr::uses_now),
            _ => false,
        }
    }

    /// Fields referenced anywhere in the expression, in first-use order.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, out: &mut Vec<Field>) {
        match self {
            Expr::Const { .. } => {}
            Expr::Flag { field } | Expr::IntIn { field, .. } => push_unique(out, *field),
            Expr::FlagEquals { left, right } => {
                push_unique(out, *left);
                push_unique(out, *right);
            }
            Expr::Compare { left, right, .. } => {
                for term in [left, right] {
                    if let IntExpr::Field { field } = term {
                        push_unique(out, *field);
                    }
                }
            }
            Expr::ContentEquals { .. } | Expr::ContentContains { .. } | Expr::ContentIn { .. } => {
                push_unique(out, Field::Content)
            }
            Expr::VisibilityIn { .. } => push_unique(out, Field::Visibility),
            Expr::HasTag { .. } => push_unique(out, Field::Tags),
            Expr::Not { operand } => operand.collect_fields(out),
            Expr::All { operands } | Expr::Any { operands } => {
                for operand in operands {
                    operand.collect_fields(out);
                }
            }
        }
    }
}

fn push_unique(out: &mut Vec<Field>, field: Field) {
    if !out.contains(&field) {
        out.push(field);
    }
}

impl IntExpr {
    /// Returns true if the term reads the clock.
    pub fn uses_now(&self) -> bool {
        match self {
            IntExpr::Now => true,
            IntExpr::Neg { operand } => operand.uses_now(),
            IntExpr::Arith { left, right, .. } => left.uses_now() || right.uses_now(),
            IntExpr::Field { .. } | IntExpr::Const { .. } => false,
        }
    }
}

/// A filter that passed type checking.
///
/// Compiled filters are inert values: compiling runs nothing, and the same
/// filter can be evaluated against any number of notes from any thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledFilter {
    source: String,
    expr: Expr,
}

impl CompiledFilter {
    pub(crate) fn new(source: impl Into<String>, expr: Expr) -> Self {
        Self {
            source: source.into(),
            expr,
        }
    }

    /// The expression text this filter was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The typed expression tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl fmt::Display for CompiledFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
