//! Type checking: resolves a [`Syntax`] tree against the note schema and
//! produces a typed [`Expr`].
//!
//! Constant arithmetic is folded here, so overflow in literal-only
//! expressions is a compile error rather than an evaluation failure.

use super::ast::{ArithOp, CmpOp, Expr, IntExpr, Literal, Syntax};
use super::error::{CompileError, FilterResult};
use super::schema::{Field, FieldType};
use crate::Visibility;

/// Name of the only method in the language.
const CONTAINS: &str = "contains";

/// Name of the only function in the language.
const NOW: &str = "now";

/// Checks a parsed expression used as a predicate.
pub(crate) fn check(syntax: &Syntax) -> FilterResult<Expr> {
    match syntax {
        Syntax::Literal(Literal::Bool(value)) => Ok(Expr::Const { value: *value }),
        Syntax::Ident(name) => {
            let field = resolve(name)?;
            if field.field_type() == FieldType::Bool {
                Ok(Expr::Flag { field })
            } else {
                Err(CompileError::type_mismatch(format!(
                    "field '{field}' is {}, not a boolean",
                    field.field_type()
                )))
            }
        }
        Syntax::Call(name) if name != NOW => Err(CompileError::unknown_function(name.as_str())),
        Syntax::Method {
            receiver,
            name,
            args,
        } => check_method(receiver, name, args),
        Syntax::Not(inner) => Ok(Expr::negate(check(inner)?)),
        Syntax::And(operands) => Ok(Expr::All {
            operands: operands.iter().map(check).collect::<FilterResult<_>>()?,
        }),
        Syntax::Or(operands) => Ok(Expr::Any {
            operands: operands.iter().map(check).collect::<FilterResult<_>>()?,
        }),
        Syntax::Compare { op, left, right } => check_compare(*op, left, right),
        Syntax::In { needle, haystack } => check_in(needle, haystack),
        other => Err(CompileError::type_mismatch(format!(
            "expected a boolean expression, found {}",
            other.describe()
        ))),
    }
}

/// Looks up a field, suggesting the closest name when it does not exist.
fn resolve(name: &str) -> FilterResult<Field> {
    Field::from_name(name).ok_or_else(|| CompileError::unknown_field(name, Field::suggest(name)))
}

fn check_method(receiver: &Syntax, name: &str, args: &[Syntax]) -> FilterResult<Expr> {
    if name != CONTAINS {
        return Err(CompileError::unknown_function(name));
    }

    let Syntax::Ident(field_name) = receiver else {
        return Err(CompileError::type_mismatch(format!(
            "contains() needs a field receiver, found {}",
            receiver.describe()
        )));
    };
    let field = resolve(field_name)?;
    if field != Field::Content {
        return Err(CompileError::type_mismatch(format!(
            "contains() is only available on content, not on '{field}'"
        )));
    }

    match args {
        [Syntax::Literal(Literal::Str(needle))] => Ok(Expr::ContentContains {
            needle: needle.clone(),
        }),
        _ => Err(CompileError::type_mismatch(
            "contains() takes exactly one string literal",
        )),
    }
}

/// One side of a comparison, after resolving names.
enum Operand {
    Field(Field),
    Bool(bool),
    Str(String),
    Int(IntExpr),
}

impl Operand {
    fn describe(&self) -> String {
        match self {
            Operand::Field(field) => format!("field '{field}' ({})", field.field_type()),
            Operand::Bool(value) => format!("literal {value}"),
            Operand::Str(value) => format!("literal {value:?}"),
            Operand::Int(_) => "an integer".to_string(),
        }
    }
}

fn operand(syntax: &Syntax) -> FilterResult<Operand> {
    match syntax {
        Syntax::Ident(name) => resolve(name).map(Operand::Field),
        Syntax::Literal(Literal::Bool(value)) => Ok(Operand::Bool(*value)),
        Syntax::Literal(Literal::Str(value)) => Ok(Operand::Str(value.clone())),
        Syntax::Literal(Literal::Int(_)) | Syntax::Call(_) | Syntax::Neg(_) | Syntax::Arith { .. } => {
            constant(syntax).map(Operand::Int)
        }
        other => Err(CompileError::type_mismatch(format!(
            "cannot compare {}",
            other.describe()
        ))),
    }
}

/// Checks an integer constant expression (literals and `now()` only),
/// folding literal-only subtrees.
fn constant(syntax: &Syntax) -> FilterResult<IntExpr> {
    match syntax {
        Syntax::Literal(Literal::Int(value)) => Ok(IntExpr::Const { value: *value }),
        Syntax::Call(name) if name == NOW => Ok(IntExpr::Now),
        Syntax::Call(name) => Err(CompileError::unknown_function(name.as_str())),
        Syntax::Neg(inner) => match constant(inner)? {
            IntExpr::Const { value } => value
                .checked_neg()
                .map(|value| IntExpr::Const { value })
                .ok_or(CompileError::IntegerOverflow),
            operand => Ok(IntExpr::Neg {
                operand: Box::new(operand),
            }),
        },
        Syntax::Arith { op, left, right } => {
            let left = constant(left)?;
            let right = constant(right)?;
            match (&left, &right) {
                (IntExpr::Const { value: a }, IntExpr::Const { value: b }) => apply_arith(*op, *a, *b)
                    .map(|value| IntExpr::Const { value })
                    .ok_or(CompileError::IntegerOverflow),
                _ => Ok(IntExpr::Arith {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(right),
                }),
            }
        }
        Syntax::Ident(name) => {
            let field = resolve(name)?;
            Err(CompileError::type_mismatch(format!(
                "arithmetic is only allowed on literals and now(), found field '{field}'"
            )))
        }
        other => Err(CompileError::type_mismatch(format!(
            "expected an integer, found {}",
            other.describe()
        ))),
    }
}

/// Checked arithmetic shared by folding and evaluation.
pub(crate) fn apply_arith(op: ArithOp, a: i64, b: i64) -> Option<i64> {
    match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
    }
}

fn check_compare(op: CmpOp, left: &Syntax, right: &Syntax) -> FilterResult<Expr> {
    let left = operand(left)?;
    let right = operand(right)?;

    match (left, right) {
        (Operand::Field(a), Operand::Field(b)) => compare_fields(op, a, b),
        (Operand::Field(field), other) => compare_field(op, field, other),
        (other, Operand::Field(field)) => compare_field(op.flipped(), field, other),
        (Operand::Int(a), Operand::Int(b)) => Ok(Expr::Compare {
            op,
            left: a,
            right: b,
        }),
        (a, b) => Err(CompileError::type_mismatch(format!(
            "cannot compare {} with {}",
            a.describe(),
            b.describe()
        ))),
    }
}

fn compare_fields(op: CmpOp, a: Field, b: Field) -> FilterResult<Expr> {
    let (ta, tb) = (a.field_type(), b.field_type());

    if ta.is_integer() && tb.is_integer() {
        return Ok(Expr::Compare {
            op,
            left: IntExpr::Field { field: a },
            right: IntExpr::Field { field: b },
        });
    }
    if ta == FieldType::Bool && tb == FieldType::Bool && op.is_equality() {
        return Ok(negate_if(
            op == CmpOp::NotEq,
            Expr::FlagEquals { left: a, right: b },
        ));
    }

    Err(CompileError::type_mismatch(format!(
        "cannot compare field '{a}' ({ta}) with field '{b}' ({tb}) using {op}"
    )))
}

/// Compares a field with a non-field operand (`field op other`).
fn compare_field(op: CmpOp, field: Field, other: Operand) -> FilterResult<Expr> {
    let field_type = field.field_type();

    match (field_type, other) {
        (t, Operand::Int(term)) if t.is_integer() => Ok(Expr::Compare {
            op,
            left: IntExpr::Field { field },
            right: term,
        }),
        (FieldType::Bool, Operand::Bool(value)) if op.is_equality() => {
            // `flag == true` and `flag != false` are the flag itself.
            let positive = (op == CmpOp::Eq) == value;
            Ok(negate_if(!positive, Expr::Flag { field }))
        }
        (FieldType::String, Operand::Str(value)) if op.is_equality() => Ok(negate_if(
            op == CmpOp::NotEq,
            Expr::ContentEquals { value },
        )),
        (FieldType::Enum(_), Operand::Str(value)) if op.is_equality() => {
            let visibility = visibility(field, &value)?;
            Ok(negate_if(
                op == CmpOp::NotEq,
                Expr::VisibilityIn {
                    values: vec![visibility],
                },
            ))
        }
        (FieldType::List, _) => Err(CompileError::type_mismatch(format!(
            "'{field}' can only be tested with \"name\" in {field}"
        ))),
        (_, other) => Err(CompileError::type_mismatch(format!(
            "cannot compare field '{field}' ({field_type}) with {} using {op}",
            other.describe()
        ))),
    }
}

fn check_in(needle: &Syntax, haystack: &Syntax) -> FilterResult<Expr> {
    match haystack {
        Syntax::Ident(name) => {
            let field = resolve(name)?;
            if field != Field::Tags {
                return Err(CompileError::type_mismatch(format!(
                    "'in' needs tags or a list on the right, found field '{field}'"
                )));
            }
            match needle {
                Syntax::Literal(Literal::Str(tag)) => Ok(Expr::HasTag { name: tag.clone() }),
                other => Err(CompileError::type_mismatch(format!(
                    "expected a string literal before 'in {field}', found {}",
                    other.describe()
                ))),
            }
        }
        Syntax::List(items) => {
            let Syntax::Ident(name) = needle else {
                return Err(CompileError::type_mismatch(format!(
                    "expected a field before 'in [...]', found {}",
                    needle.describe()
                )));
            };
            let field = resolve(name)?;
            match field.field_type() {
                FieldType::String => Ok(Expr::ContentIn {
                    values: string_items(field, items)?,
                }),
                FieldType::Enum(_) => {
                    let values = string_items(field, items)?
                        .iter()
                        .map(|value| visibility(field, value))
                        .collect::<FilterResult<_>>()?;
                    Ok(Expr::VisibilityIn { values })
                }
                t if t.is_integer() => {
                    let values = items
                        .iter()
                        .map(|item| match item {
                            Literal::Int(value) => Ok(*value),
                            other => Err(list_item_mismatch(field, other)),
                        })
                        .collect::<FilterResult<_>>()?;
                    Ok(Expr::IntIn { field, values })
                }
                t => Err(CompileError::type_mismatch(format!(
                    "'in [...]' is not defined for field '{field}' ({t})"
                ))),
            }
        }
        other => Err(CompileError::type_mismatch(format!(
            "'in' needs tags or a list on the right, found {}",
            other.describe()
        ))),
    }
}

fn string_items(field: Field, items: &[Literal]) -> FilterResult<Vec<String>> {
    items
        .iter()
        .map(|item| match item {
            Literal::Str(value) => Ok(value.clone()),
            other => Err(list_item_mismatch(field, other)),
        })
        .collect()
}

fn list_item_mismatch(field: Field, item: &Literal) -> CompileError {
    CompileError::type_mismatch(format!(
        "list item {item} does not match field '{field}' ({})",
        field.field_type()
    ))
}

fn visibility(field: Field, value: &str) -> FilterResult<Visibility> {
    value
        .parse::<Visibility>()
        .map_err(|_| CompileError::invalid_enum_value(field.name(), value))
}

fn negate_if(negate: bool, expr: Expr) -> Expr {
    if negate {
        Expr::negate(expr)
    } else {
        expr
    }
}
