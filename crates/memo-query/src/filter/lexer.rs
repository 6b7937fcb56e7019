//! Lexer (tokenizer) for filter expressions.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use super::error::CompileError;

/// Result of tokenizing a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerResult {
    /// The tokens successfully read, with their positions.
    pub tokens: Vec<PositionedToken>,
    /// Errors encountered, in input order.
    pub errors: Vec<CompileError>,
}

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: FilterToken,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// A token in a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterToken {
    // ==================== Literals ====================
    /// A field or function name.
    Ident(String),

    /// A decimal integer literal.
    Int(i64),

    /// A quoted string literal, escapes resolved.
    Str(String),

    /// `true`.
    True,

    /// `false`.
    False,

    // ==================== Keywords ====================
    /// `in`.
    In,

    // ==================== Operators ====================
    /// `&&`.
    And,

    /// `||`.
    Or,

    /// `!`.
    Not,

    /// `==`.
    Eq,

    /// `!=`.
    NotEq,

    /// `<`.
    Less,

    /// `<=`.
    LessEq,

    /// `>`.
    Greater,

    /// `>=`.
    GreaterEq,

    /// `+`.
    Plus,

    /// `-`.
    Minus,

    /// `*`.
    Star,

    // ==================== Punctuation ====================
    /// `(`.
    OpenParen,

    /// `)`.
    CloseParen,

    /// `[`.
    OpenBracket,

    /// `]`.
    CloseBracket,

    /// `,`.
    Comma,

    /// `.`.
    Dot,
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterToken::Ident(name) => write!(f, "{name}"),
            FilterToken::Int(value) => write!(f, "{value}"),
            FilterToken::Str(value) => write!(f, "{value:?}"),
            FilterToken::True => f.write_str("true"),
            FilterToken::False => f.write_str("false"),
            FilterToken::In => f.write_str("in"),
            FilterToken::And => f.write_str("&&"),
            FilterToken::Or => f.write_str("||"),
            FilterToken::Not => f.write_str("!"),
            FilterToken::Eq => f.write_str("=="),
            FilterToken::NotEq => f.write_str("!="),
            FilterToken::Less => f.write_str("<"),
            FilterToken::LessEq => f.write_str("<="),
            FilterToken::Greater => f.write_str(">"),
            FilterToken::GreaterEq => f.write_str(">="),
            FilterToken::Plus => f.write_str("+"),
            FilterToken::Minus => f.write_str("-"),
            FilterToken::Star => f.write_str("*"),
            FilterToken::OpenParen => f.write_str("("),
            FilterToken::CloseParen => f.write_str(")"),
            FilterToken::OpenBracket => f.write_str("["),
            FilterToken::CloseBracket => f.write_str("]"),
            FilterToken::Comma => f.write_str(","),
            FilterToken::Dot => f.write_str("."),
        }
    }
}

/// Lexer for tokenizing filter expressions.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Current byte position in the input string.
    position: usize,
    /// Errors encountered during tokenization.
    errors: Vec<CompileError>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            self.position += ch.len_utf8();
        }
        c
    }

    /// Consumes the next character if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.next_char();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.next_char();
        }
    }

    /// Reads an identifier: a letter or `_`, then letters, digits or `_`.
    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.next_char();
            } else {
                break;
            }
        }
        ident
    }

    fn read_number(&mut self) -> Result<i64, CompileError> {
        let mut literal = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                literal.push(c);
                self.next_char();
            } else {
                break;
            }
        }
        literal
            .parse::<i64>()
            .map_err(|_| CompileError::InvalidNumber { literal })
    }

    /// Reads a quoted string (single or double quotes).
    fn read_quoted_string(&mut self, quote_char: char, start: usize) -> Result<String, CompileError> {
        // Consume the opening quote
        self.next_char();

        let mut result = String::new();
        while let Some(c) = self.next_char() {
            if c == quote_char {
                return Ok(result);
            }
            if c == '\\' {
                match self.next_char() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some(escaped) => result.push(escaped),
                    None => break,
                }
            } else {
                result.push(c);
            }
        }
        Err(CompileError::UnterminatedString { position: start })
    }

    /// Returns the next token with its position, or None if at end of input.
    pub fn next_token(&mut self) -> Option<PositionedToken> {
        loop {
            self.skip_whitespace();

            let c = self.peek()?;
            let position = self.position;

            let token = match c {
                '"' | '\'' => self.read_quoted_string(c, position).map(FilterToken::Str),
                _ if c.is_ascii_digit() => self.read_number().map(FilterToken::Int),
                _ if c.is_alphabetic() || c == '_' => {
                    let ident = self.read_identifier();
                    Ok(match ident.as_str() {
                        "true" => FilterToken::True,
                        "false" => FilterToken::False,
                        "in" => FilterToken::In,
                        _ => FilterToken::Ident(ident),
                    })
                }
                _ => {
                    self.next_char();
                    self.operator(c, position)
                }
            };

            match token {
                Ok(token) => return Some(PositionedToken { token, position }),
                Err(err) => self.errors.push(err),
            }
        }
    }

    /// Reads an operator or punctuation token whose first character `c` has
    /// already been consumed.
    fn operator(&mut self, c: char, position: usize) -> Result<FilterToken, CompileError> {
        let token = match c {
            '&' if self.eat('&') => FilterToken::And,
            '|' if self.eat('|') => FilterToken::Or,
            '=' if self.eat('=') => FilterToken::Eq,
            '!' if self.eat('=') => FilterToken::NotEq,
            '!' => FilterToken::Not,
            '<' if self.eat('=') => FilterToken::LessEq,
            '<' => FilterToken::Less,
            '>' if self.eat('=') => FilterToken::GreaterEq,
            '>' => FilterToken::Greater,
            '+' => FilterToken::Plus,
            '-' => FilterToken::Minus,
            '*' => FilterToken::Star,
            '(' => FilterToken::OpenParen,
            ')' => FilterToken::CloseParen,
            '[' => FilterToken::OpenBracket,
            ']' => FilterToken::CloseBracket,
            ',' => FilterToken::Comma,
            '.' => FilterToken::Dot,
            _ => {
                return Err(CompileError::UnexpectedCharacter {
                    character: c,
                    position,
                })
            }
        };
        Ok(token)
    }

    /// Collects all tokens into a vector (without positions).
    #[cfg(test)]
    pub fn tokenize(self) -> Vec<FilterToken> {
        self.tokenize_with_errors()
            .tokens
            .into_iter()
            .map(|pt| pt.token)
            .collect()
    }

    /// Collects all tokens and any errors encountered.
    pub fn tokenize_with_errors(mut self) -> LexerResult {
        let mut tokens = Vec::new();
        while let Some(positioned_token) = self.next_token() {
            tokens.push(positioned_token);
        }
        LexerResult {
            tokens,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> FilterToken {
        FilterToken::Ident(name.to_string())
    }

    #[test]
    fn test_tokenize_comparison() {
        let tokens = Lexer::new("creator_id == 101").tokenize();
        assert_eq!(
            tokens,
            vec![ident("creator_id"), FilterToken::Eq, FilterToken::Int(101)]
        );
    }

    #[test]
    fn test_tokenize_all_comparison_operators() {
        let tokens = Lexer::new("== != < <= > >=").tokenize();
        assert_eq!(
            tokens,
            vec![
                FilterToken::Eq,
                FilterToken::NotEq,
                FilterToken::Less,
                FilterToken::LessEq,
                FilterToken::Greater,
                FilterToken::GreaterEq,
            ]
        );
    }

    #[test]
    fn test_tokenize_logical_operators() {
        let tokens = Lexer::new("!a && b || !c").tokenize();
        assert_eq!(
            tokens,
            vec![
                FilterToken::Not,
                ident("a"),
                FilterToken::And,
                ident("b"),
                FilterToken::Or,
                FilterToken::Not,
                ident("c"),
            ]
        );
    }

    #[test]
    fn test_tokenize_arithmetic() {
        let tokens = Lexer::new("now() - 7*24").tokenize();
        assert_eq!(
            tokens,
            vec![
                ident("now"),
                FilterToken::OpenParen,
                FilterToken::CloseParen,
                FilterToken::Minus,
                FilterToken::Int(7),
                FilterToken::Star,
                FilterToken::Int(24),
            ]
        );
    }

    #[test]
    fn test_tokenize_keywords_are_case_sensitive() {
        let tokens = Lexer::new("true false in True IN").tokenize();
        assert_eq!(
            tokens,
            vec![
                FilterToken::True,
                FilterToken::False,
                FilterToken::In,
                ident("True"),
                ident("IN"),
            ]
        );
    }

    #[test]
    fn test_tokenize_strings_with_escapes() {
        let tokens = Lexer::new(r#""a\"b" 'it\'s' "x\ny\t\\""#).tokenize();
        assert_eq!(
            tokens,
            vec![
                FilterToken::Str("a\"b".to_string()),
                FilterToken::Str("it's".to_string()),
                FilterToken::Str("x\ny\t\\".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_unicode_string() {
        let tokens = Lexer::new("\"工作\" in tags").tokenize();
        assert_eq!(
            tokens,
            vec![FilterToken::Str("工作".to_string()), FilterToken::In, ident("tags")]
        );
    }

    #[test]
    fn test_tokenize_list_and_method() {
        let tokens = Lexer::new("content.contains('x') || visibility in ['A', 'B']").tokenize();
        assert_eq!(tokens.len(), 14);
        assert_eq!(tokens[1], FilterToken::Dot);
        assert_eq!(tokens[9], FilterToken::OpenBracket);
        assert_eq!(tokens[11], FilterToken::Comma);
        assert_eq!(tokens[13], FilterToken::CloseBracket);
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let result = Lexer::new("\"é\" == x").tokenize_with_errors();
        let positions: Vec<usize> = result.tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 5, 8]);
    }

    #[test]
    fn test_unknown_character_is_reported() {
        let result = Lexer::new("pinned $ x").tokenize_with_errors();
        assert_eq!(
            result.errors,
            vec![CompileError::UnexpectedCharacter {
                character: '$',
                position: 7
            }]
        );
        assert_eq!(result.tokens.len(), 2);
    }

    #[test]
    fn test_single_ampersand_pipe_and_equals_are_errors() {
        for (input, character) in [("a & b", '&'), ("a | b", '|'), ("a = b", '=')] {
            let result = Lexer::new(input).tokenize_with_errors();
            assert_eq!(
                result.errors,
                vec![CompileError::UnexpectedCharacter {
                    character,
                    position: 2
                }],
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_unterminated_string() {
        let result = Lexer::new("content == \"open").tokenize_with_errors();
        assert_eq!(
            result.errors,
            vec![CompileError::UnterminatedString { position: 11 }]
        );
    }

    #[test]
    fn test_integer_out_of_range() {
        let result = Lexer::new("created_ts > 99999999999999999999").tokenize_with_errors();
        assert_eq!(
            result.errors,
            vec![CompileError::InvalidNumber {
                literal: "99999999999999999999".to_string()
            }]
        );
    }

    #[test]
    fn test_display_round_trips_operators() {
        let rendered: Vec<String> = Lexer::new("&& || <= [ ]")
            .tokenize()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rendered, vec!["&&", "||", "<=", "[", "]"]);
    }
}
