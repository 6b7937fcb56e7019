//! Recursive descent parser for filter expressions.

use super::ast::{ArithOp, CmpOp, CompiledFilter, Literal, Syntax};
use super::check::check;
use super::error::{CompileError, FilterResult};
use super::lexer::{FilterToken, Lexer, PositionedToken};

/// Maximum nesting of parentheses, negations and operator chains.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parser for filter expressions.
///
/// Parsing produces an untyped tree that is then checked against the note
/// schema, so every error (syntax, unknown field, type mismatch, constant
/// overflow) is reported before any note is evaluated.
///
/// # Grammar
///
/// ```text
/// expression ::= or_expr
/// or_expr    ::= and_expr ("||" and_expr)*
/// and_expr   ::= unary ("&&" unary)*
/// unary      ::= "!" unary | comparison
/// comparison ::= sum (cmp_op sum)? | sum "in" (ident | list)
/// sum        ::= product (("+" | "-") product)*
/// product    ::= prefix ("*" prefix)*
/// prefix     ::= "-" prefix | postfix
/// postfix    ::= primary ("." ident "(" args ")")?
/// primary    ::= literal | ident | ident "(" ")" | "(" expression ")" | list
/// list       ::= "[" (literal ("," literal)*)? "]"
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. `.method()` - postfix
/// 2. `-` - unary minus
/// 3. `*`
/// 4. `+`, `-`
/// 5. `==`, `!=`, `<`, `<=`, `>`, `>=`, `in` - non-associative
/// 6. `!` (NOT) - unary
/// 7. `&&` (AND) - left-associative
/// 8. `||` (OR) - left-associative
///
/// # Example
///
/// ```
/// use memo_query_rs::filter::FilterParser;
///
/// let filter = FilterParser::parse(r#"pinned && "work" in tags"#).unwrap();
/// assert_eq!(filter.source(), r#"pinned && "work" in tags"#);
///
/// assert!(FilterParser::parse("pinned == \"true\"").is_err());
/// ```
pub struct FilterParser {
    tokens: Vec<PositionedToken>,
    position: usize,
    depth: usize,
}

impl FilterParser {
    /// Parses and type-checks a filter expression.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::EmptyExpression` if the input is empty or
    /// whitespace, the first lexical error if any character cannot be
    /// tokenized, a syntax error for malformed input, and a schema error
    /// (`UnknownField`, `TypeMismatch`, `InvalidEnumValue`, ...) for
    /// expressions that are well-formed but ill-typed.
    pub fn parse(input: &str) -> FilterResult<CompiledFilter> {
        let syntax = Self::parse_syntax(input)?;
        let expr = check(&syntax)?;
        log::debug!("compiled filter {input:?} into {expr:?}");
        Ok(CompiledFilter::new(input.trim(), expr))
    }

    /// Parses without type checking.
    pub(crate) fn parse_syntax(input: &str) -> FilterResult<Syntax> {
        if input.trim().is_empty() {
            return Err(CompileError::EmptyExpression);
        }

        let result = Lexer::new(input).tokenize_with_errors();
        if let Some(err) = result.errors.into_iter().next() {
            return Err(err);
        }
        if result.tokens.is_empty() {
            return Err(CompileError::EmptyExpression);
        }

        let mut parser = Self {
            tokens: result.tokens,
            position: 0,
            depth: 0,
        };
        let syntax = parser.parse_expression()?;

        // Check that we consumed all tokens
        if let Some(remaining) = parser.tokens.get(parser.position) {
            return Err(unexpected(remaining));
        }

        Ok(syntax)
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&FilterToken> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<&PositionedToken> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Checks if the current token matches the expected token type.
    fn check(&self, expected: &FilterToken) -> bool {
        self.peek() == Some(expected)
    }

    /// Consumes `expected` or fails with the token found instead.
    fn expect(&mut self, expected: &FilterToken) -> FilterResult<()> {
        match self.advance() {
            Some(t) if &t.token == expected => Ok(()),
            Some(t) => Err(unexpected(t)),
            None => Err(CompileError::UnexpectedEndOfInput),
        }
    }

    /// Enters one nesting level.
    fn descend(&mut self) -> FilterResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(CompileError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn parse_expression(&mut self) -> FilterResult<Syntax> {
        self.parse_or_expr()
    }

    /// Parses OR expressions: `and_expr ("||" and_expr)*`
    fn parse_or_expr(&mut self) -> FilterResult<Syntax> {
        let first = self.parse_and_expr()?;
        if !self.check(&FilterToken::Or) {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.check(&FilterToken::Or) {
            self.advance(); // consume '||'
            operands.push(self.parse_and_expr()?);
        }
        Ok(Syntax::Or(operands))
    }

    /// Parses AND expressions: `unary ("&&" unary)*`
    fn parse_and_expr(&mut self) -> FilterResult<Syntax> {
        let first = self.parse_unary_expr()?;
        if !self.check(&FilterToken::And) {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.check(&FilterToken::And) {
            self.advance(); // consume '&&'
            operands.push(self.parse_unary_expr()?);
        }
        Ok(Syntax::And(operands))
    }

    /// Parses unary expressions: `"!" unary | comparison`
    fn parse_unary_expr(&mut self) -> FilterResult<Syntax> {
        if self.check(&FilterToken::Not) {
            self.advance(); // consume '!'
            self.descend()?;
            let inner = self.parse_unary_expr()?;
            self.ascend(1);
            return Ok(Syntax::Not(Box::new(inner)));
        }

        self.parse_comparison()
    }

    /// Parses `sum (cmp_op sum)?` and `sum "in" (ident | list)`.
    fn parse_comparison(&mut self) -> FilterResult<Syntax> {
        let left = self.parse_sum()?;

        if self.check(&FilterToken::In) {
            self.advance(); // consume 'in'
            let haystack = match self.advance().cloned() {
                Some(PositionedToken {
                    token: FilterToken::Ident(name),
                    ..
                }) => Syntax::Ident(name),
                Some(PositionedToken {
                    token: FilterToken::OpenBracket,
                    ..
                }) => self.parse_list()?,
                Some(other) => return Err(unexpected(&other)),
                None => return Err(CompileError::UnexpectedEndOfInput),
            };
            return Ok(Syntax::In {
                needle: Box::new(left),
                haystack: Box::new(haystack),
            });
        }

        let Some(op) = self.peek().and_then(comparison_op) else {
            return Ok(left);
        };
        self.advance(); // consume operator
        let right = self.parse_sum()?;

        if let Some(extra) = self.tokens.get(self.position) {
            if comparison_op(&extra.token).is_some() || extra.token == FilterToken::In {
                return Err(unexpected(extra));
            }
        }

        Ok(Syntax::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Parses `product (("+" | "-") product)*`
    fn parse_sum(&mut self) -> FilterResult<Syntax> {
        let mut left = self.parse_product()?;
        let mut levels = 0;

        loop {
            let op = match self.peek() {
                Some(FilterToken::Plus) => ArithOp::Add,
                Some(FilterToken::Minus) => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            self.descend()?;
            levels += 1;
            let right = self.parse_product()?;
            left = Syntax::Arith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.ascend(levels);
        Ok(left)
    }

    /// Parses `prefix ("*" prefix)*`
    fn parse_product(&mut self) -> FilterResult<Syntax> {
        let mut left = self.parse_prefix()?;
        let mut levels = 0;

        while self.check(&FilterToken::Star) {
            self.advance(); // consume '*'
            self.descend()?;
            levels += 1;
            let right = self.parse_prefix()?;
            left = Syntax::Arith {
                op: ArithOp::Mul,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.ascend(levels);
        Ok(left)
    }

    /// Parses `"-" prefix | postfix`
    fn parse_prefix(&mut self) -> FilterResult<Syntax> {
        if self.check(&FilterToken::Minus) {
            self.advance(); // consume '-'
            self.descend()?;
            let inner = self.parse_prefix()?;
            self.ascend(1);
            return Ok(Syntax::Neg(Box::new(inner)));
        }

        self.parse_postfix()
    }

    /// Parses `primary ("." ident "(" args ")")?`
    fn parse_postfix(&mut self) -> FilterResult<Syntax> {
        let receiver = self.parse_primary()?;
        if !self.check(&FilterToken::Dot) {
            return Ok(receiver);
        }
        self.advance(); // consume '.'

        let name = match self.advance() {
            Some(PositionedToken {
                token: FilterToken::Ident(name),
                ..
            }) => name.clone(),
            Some(other) => return Err(unexpected(other)),
            None => return Err(CompileError::UnexpectedEndOfInput),
        };
        self.expect(&FilterToken::OpenParen)?;

        self.descend()?;
        let mut args = Vec::new();
        if !self.check(&FilterToken::CloseParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.check(&FilterToken::Comma) {
                    break;
                }
                self.advance(); // consume ','
            }
        }
        if self.peek().is_none() {
            return Err(CompileError::UnclosedParenthesis);
        }
        self.expect(&FilterToken::CloseParen)?;
        self.ascend(1);

        Ok(Syntax::Method {
            receiver: Box::new(receiver),
            name,
            args,
        })
    }

    /// Parses literals, identifiers, `name()`, parenthesized expressions and
    /// lists.
    fn parse_primary(&mut self) -> FilterResult<Syntax> {
        let token = self
            .advance()
            .cloned()
            .ok_or(CompileError::UnexpectedEndOfInput)?;

        match token.token {
            FilterToken::Int(value) => Ok(Syntax::Literal(Literal::Int(value))),
            FilterToken::Str(value) => Ok(Syntax::Literal(Literal::Str(value))),
            FilterToken::True => Ok(Syntax::Literal(Literal::Bool(true))),
            FilterToken::False => Ok(Syntax::Literal(Literal::Bool(false))),

            FilterToken::Ident(name) => {
                if !self.check(&FilterToken::OpenParen) {
                    return Ok(Syntax::Ident(name));
                }
                self.advance(); // consume '('
                match self.advance() {
                    Some(PositionedToken {
                        token: FilterToken::CloseParen,
                        ..
                    }) => Ok(Syntax::Call(name)),
                    Some(other) => Err(unexpected(other)),
                    None => Err(CompileError::UnclosedParenthesis),
                }
            }

            // Parenthesized expression
            FilterToken::OpenParen => {
                self.descend()?;
                let inner = self.parse_expression()?;
                if !self.check(&FilterToken::CloseParen) {
                    return match self.tokens.get(self.position) {
                        Some(extra) => Err(unexpected(extra)),
                        None => Err(CompileError::UnclosedParenthesis),
                    };
                }
                self.advance(); // consume ')'
                self.ascend(1);
                Ok(inner)
            }

            FilterToken::OpenBracket => self.parse_list(),

            _ => Err(unexpected(&token)),
        }
    }

    /// Parses the rest of a list after its `[`.
    fn parse_list(&mut self) -> FilterResult<Syntax> {
        let mut items = Vec::new();
        if self.check(&FilterToken::CloseBracket) {
            self.advance();
            return Ok(Syntax::List(items));
        }

        loop {
            items.push(self.parse_list_literal()?);
            match self.advance() {
                Some(PositionedToken {
                    token: FilterToken::Comma,
                    ..
                }) => continue,
                Some(PositionedToken {
                    token: FilterToken::CloseBracket,
                    ..
                }) => return Ok(Syntax::List(items)),
                Some(other) => return Err(unexpected(other)),
                None => return Err(CompileError::UnclosedParenthesis),
            }
        }
    }

    fn parse_list_literal(&mut self) -> FilterResult<Literal> {
        let token = self
            .advance()
            .cloned()
            .ok_or(CompileError::UnclosedParenthesis)?;

        match token.token {
            FilterToken::Int(value) => Ok(Literal::Int(value)),
            FilterToken::Str(value) => Ok(Literal::Str(value)),
            FilterToken::True => Ok(Literal::Bool(true)),
            FilterToken::False => Ok(Literal::Bool(false)),
            FilterToken::Minus => match self.advance().cloned() {
                Some(PositionedToken {
                    token: FilterToken::Int(value),
                    ..
                }) => value
                    .checked_neg()
                    .map(Literal::Int)
                    .ok_or(CompileError::IntegerOverflow),
                Some(other) => Err(unexpected(&other)),
                None => Err(CompileError::UnclosedParenthesis),
            },
            _ => Err(unexpected(&token)),
        }
    }
}

fn comparison_op(token: &FilterToken) -> Option<CmpOp> {
    match token {
        FilterToken::Eq => Some(CmpOp::Eq),
        FilterToken::NotEq => Some(CmpOp::NotEq),
        FilterToken::Less => Some(CmpOp::Less),
        FilterToken::LessEq => Some(CmpOp::LessEq),
        FilterToken::Greater => Some(CmpOp::Greater),
        FilterToken::GreaterEq => Some(CmpOp::GreaterEq),
        _ => None,
    }
}

fn unexpected(token: &PositionedToken) -> CompileError {
    CompileError::unexpected_token(format!(
        "'{}' at position {}",
        token.token, token.position
    ))
}
