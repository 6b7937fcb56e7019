//! Error types for filter compilation and evaluation.

use thiserror::Error;

use super::schema::Field;

/// A specialized Result type for filter compilation.
pub type FilterResult<T> = Result<T, CompileError>;

/// Alias kept for callers that think of compilation as parsing.
pub type FilterError = CompileError;

/// Errors that can occur while compiling a filter expression.
///
/// Every error is reported before any note is looked at.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    /// The filter expression is empty.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// A character that starts no token.
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter {
        /// The character that could not be tokenized.
        character: char,
        /// Byte offset in the expression.
        position: usize,
    },

    /// A string literal without its closing quote.
    #[error("unterminated string starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// An integer literal that does not fit in 64 bits.
    #[error("invalid number: {literal}")]
    InvalidNumber {
        /// The literal as written.
        literal: String,
    },

    /// An unexpected token was encountered during parsing.
    #[error("unexpected token: {token}")]
    UnexpectedToken {
        /// The unexpected token that was encountered.
        token: String,
    },

    /// An unexpected end of input was encountered.
    #[error("unexpected end of expression")]
    UnexpectedEndOfInput,

    /// An unclosed parenthesis or bracket was found.
    #[error("unclosed parenthesis")]
    UnclosedParenthesis,

    /// An identifier that names no field.
    #[error("unknown field: {name}{}", suggestion_suffix(.suggestion))]
    UnknownField {
        /// The identifier as written.
        name: String,
        /// The closest field name, if any is close enough.
        suggestion: Option<String>,
    },

    /// A call to a function or method that does not exist.
    #[error("unknown function: {name}")]
    UnknownFunction {
        /// The function name as written.
        name: String,
    },

    /// Operands of the wrong type for an operator.
    #[error("type mismatch: {message}")]
    TypeMismatch {
        /// What was expected and what was found.
        message: String,
    },

    /// A literal that is not a value of an enum field.
    #[error("invalid value '{value}' for field {field}")]
    InvalidEnumValue {
        /// The enum field.
        field: String,
        /// The rejected literal.
        value: String,
    },

    /// Constant arithmetic overflowed.
    #[error("integer overflow in constant expression")]
    IntegerOverflow,

    /// The expression nests deeper than the compiler allows.
    #[error("expression nested deeper than {limit} levels")]
    NestingTooDeep {
        /// The nesting limit.
        limit: usize,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}

impl CompileError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>) -> Self {
        CompileError::UnexpectedToken {
            token: token.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(name: impl Into<String>, suggestion: Option<String>) -> Self {
        CompileError::UnknownField {
            name: name.into(),
            suggestion,
        }
    }

    /// Creates an unknown function error.
    pub fn unknown_function(name: impl Into<String>) -> Self {
        CompileError::UnknownFunction { name: name.into() }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        CompileError::TypeMismatch {
            message: message.into(),
        }
    }

    /// Creates an invalid enum value error.
    pub fn invalid_enum_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        CompileError::InvalidEnumValue {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Errors raised while evaluating a compiled filter against one note.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    /// Arithmetic over `now()` overflowed.
    #[error("integer overflow while evaluating filter")]
    Overflow,

    /// The expression reads a field as the wrong type. Only reachable for
    /// expression trees built or deserialized by hand.
    #[error("field {field} does not have the type the expression expects")]
    WrongFieldType {
        /// The offending field.
        field: Field,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_message_with_suggestion() {
        let err = CompileError::unknown_field("pined", Some("pinned".to_string()));
        assert_eq!(err.to_string(), "unknown field: pined (did you mean 'pinned'?)");
    }

    #[test]
    fn test_unknown_field_message_without_suggestion() {
        let err = CompileError::unknown_field("zzzzzz", None);
        assert_eq!(err.to_string(), "unknown field: zzzzzz");
    }

    #[test]
    fn test_position_in_message() {
        let err = CompileError::UnexpectedCharacter {
            character: '$',
            position: 4,
        };
        assert_eq!(err.to_string(), "unexpected character '$' at position 4");
    }
}
