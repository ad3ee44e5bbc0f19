use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{
    ast::{
        BinOp, Builtin, Expr, StringLiteral, Substitution, Token, TokenKind, UnaryOp,
        WhereBinding, operators,
    },
    lexer::{LexError, tokenize},
};

/// Errors that can occur while compiling formula source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Malformed lexical input
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Nothing to parse where an expression was required
    #[error("empty expression")]
    EmptyExpression,

    /// Parenthesis or bracket without a partner
    #[error("unmatched '{token}' at position {position}")]
    Unbalanced { token: String, position: usize },

    /// Call to a name outside the built-in function table
    #[error("no function '{0}'")]
    UnknownFunction(String),

    /// Built-in called with an unsupported number of arguments
    #[error("function '{function}' expects {expected} arguments, got {got}")]
    Arity {
        function: &'static str,
        expected: String,
        got: usize,
    },

    /// Operator that cannot be used as a prefix
    #[error("illegal unary operator '{0}'")]
    InvalidUnaryOperator(String),

    /// Operator that cannot join two operands
    #[error("illegal binary operator '{0}'")]
    InvalidBinaryOperator(String),

    /// Integer literal that does not fit in 64 bits
    #[error("invalid integer literal '{0}'")]
    InvalidInteger(String),

    /// `where` not followed by `name=<expression>` bindings
    #[error("malformed where clause: {0}; 'where name=<expression>' was needed")]
    MalformedWhere(String),

    /// The same name bound twice in one `where` clause
    #[error("duplicate where binding '{0}'")]
    DuplicateBinding(String),

    /// Token sequence that matches no expression form
    #[error("could not parse expression: '{0}'")]
    Unparseable(String),

    /// A `{...}` substitution inside a string literal failed to compile
    #[error("in substitution '{{{fragment}}}': {source}")]
    Interpolation {
        fragment: String,
        source: Box<ParseError>,
    },
}

static SUBSTITUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]*)\}").expect("substitution pattern is valid"));

/// Builds expression trees from tokens by precedence climbing.
///
/// Each span is split at its loosest operator outside any parentheses or
/// brackets, and both halves are parsed recursively. Same-precedence chains
/// split at their rightmost operator so they group to the left
/// (`10 - 3 - 2` is `(10 - 3) - 2`), except `^`, which groups to the right.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
}

impl<'a> Parser<'a> {
    /// Tokenize `source` and prepare to parse it.
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        Ok(Parser {
            tokens: tokenize(source)?,
        })
    }

    pub fn from_tokens(tokens: Vec<Token<'a>>) -> Self {
        Parser { tokens }
    }

    /// Parse the whole token stream into a single expression.
    pub fn parse(&self) -> Result<Expr, ParseError> {
        check_balance(&self.tokens)?;
        self.parse_expression(&self.tokens)
    }

    fn parse_expression(&self, tokens: &[Token<'a>]) -> Result<Expr, ParseError> {
        let Some(first) = tokens.first() else {
            return Err(ParseError::EmptyExpression);
        };

        let split = find_split(tokens);

        if is_operator(first) {
            let prefix_binds_loosest = match split {
                None => true,
                Some(i) => op_precedence(first) < op_precedence(&tokens[i]),
            };
            if prefix_binds_loosest {
                let op = UnaryOp::from_spelling(first.text)
                    .ok_or_else(|| ParseError::InvalidUnaryOperator(first.text.to_string()))?;
                let operand = self.parse_expression(&tokens[1..])?;
                return Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                });
            }
        }

        match split {
            Some(i) => self.parse_binary(&tokens[..i], &tokens[i], &tokens[i + 1..]),
            None => self.parse_primary(tokens),
        }
    }

    fn parse_binary(
        &self,
        left: &[Token<'a>],
        op: &Token<'a>,
        right: &[Token<'a>],
    ) -> Result<Expr, ParseError> {
        match op.text {
            "." => Ok(Expr::Dot {
                object: Box::new(self.parse_expression(left)?),
                member: Box::new(self.parse_expression(right)?),
            }),
            "where" => {
                let body = self.parse_expression(left)?;
                let bindings = self.parse_where_clauses(right)?;
                Ok(Expr::Where {
                    body: Box::new(body),
                    bindings,
                })
            }
            spelling => {
                let op = BinOp::from_spelling(spelling)
                    .ok_or_else(|| ParseError::InvalidBinaryOperator(spelling.to_string()))?;
                Ok(Expr::Binary {
                    op,
                    left: Box::new(self.parse_expression(left)?),
                    right: Box::new(self.parse_expression(right)?),
                })
            }
        }
    }

    /// Parse primary expressions: atoms, groups, list literals and calls.
    fn parse_primary(&self, tokens: &[Token<'a>]) -> Result<Expr, ParseError> {
        let first = &tokens[0];
        let last = tokens.len() - 1;

        if tokens.len() == 1 {
            return match first.kind {
                TokenKind::Identifier => Ok(Expr::Identifier(first.text.to_string())),
                TokenKind::Integer => first
                    .text
                    .parse::<i64>()
                    .map(Expr::Integer)
                    .map_err(|_| ParseError::InvalidInteger(first.text.to_string())),
                TokenKind::StringLiteral => {
                    let content = &first.text[1..first.text.len() - 1];
                    Ok(Expr::String(parse_string_literal(content)?))
                }
                _ => Err(unparseable(tokens)),
            };
        }

        if first.opens() && matching_close(tokens, 0) == Some(last) {
            let inner = &tokens[1..last];
            return match first.kind {
                TokenKind::LParen => self.parse_expression(inner),
                _ => Ok(Expr::List(self.parse_args(inner)?)),
            };
        }

        if first.is(TokenKind::Identifier)
            && tokens[1].is(TokenKind::LParen)
            && matching_close(tokens, 1) == Some(last)
        {
            if Builtin::from_name(first.text).is_none() {
                return Err(ParseError::UnknownFunction(first.text.to_string()));
            }
            let args = self.parse_args(&tokens[2..last])?;
            let function = Builtin::resolve(first.text, args.len())?;
            return Ok(Expr::Call { function, args });
        }

        Err(unparseable(tokens))
    }

    /// Split at top-level commas and parse each piece.
    fn parse_args(&self, tokens: &[Token<'a>]) -> Result<Vec<Expr>, ParseError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        split_commas(tokens)
            .into_iter()
            .map(|piece| self.parse_expression(piece))
            .collect()
    }

    fn parse_where_clauses(&self, tokens: &[Token<'a>]) -> Result<Vec<WhereBinding>, ParseError> {
        if tokens.is_empty() {
            return Err(ParseError::MalformedWhere(
                "nothing follows 'where'".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut bindings = Vec::new();

        for clause in split_commas(tokens) {
            let (name, value) = match clause {
                [] => {
                    return Err(ParseError::MalformedWhere(
                        "empty binding between commas".to_string(),
                    ));
                }
                [name, eq, value @ ..] if eq.is(TokenKind::Operator) && eq.text == "=" => {
                    if !name.is(TokenKind::Identifier) || is_operator(name) {
                        return Err(ParseError::MalformedWhere(format!(
                            "'{}' cannot be bound",
                            name.text
                        )));
                    }
                    if value.is_empty() {
                        return Err(ParseError::MalformedWhere(format!(
                            "'{}=' has no expression",
                            name.text
                        )));
                    }
                    (name.text, value)
                }
                _ => {
                    return Err(ParseError::MalformedWhere(format!(
                        "'{}' is not a binding",
                        join_text(clause)
                    )));
                }
            };

            if !seen.insert(name) {
                return Err(ParseError::DuplicateBinding(name.to_string()));
            }
            bindings.push(WhereBinding {
                name: name.to_string(),
                value: self.parse_expression(value)?,
            });
        }

        Ok(bindings)
    }
}

/// Parse a complete formula.
///
/// # Examples
///
/// ```
/// use formula_lang::ast::{BinOp, Expr};
/// use formula_lang::parser::parse;
///
/// let expr = parse("3 + 4 * 2").unwrap();
/// assert!(matches!(expr, Expr::Binary { op: BinOp::Add, .. }));
/// assert!(parse("foo(").is_err());
/// ```
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    Parser::new(source)?.parse()
}

/// Compile the body of a string literal, cutting every `{...}` fragment out
/// of the text and recording where its result is to be inserted.
///
/// An opening brace without a closing one is kept as plain text.
pub fn parse_string_literal(content: &str) -> Result<StringLiteral, ParseError> {
    let mut text = String::with_capacity(content.len());
    let mut substitutions = Vec::new();
    let mut copied = 0;

    for caps in SUBSTITUTION.captures_iter(content) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        text.push_str(&content[copied..whole.start()]);
        copied = whole.end();

        let expr = parse(inner.as_str()).map_err(|e| ParseError::Interpolation {
            fragment: inner.as_str().to_string(),
            source: Box::new(e),
        })?;
        substitutions.push(Substitution {
            offset: text.len(),
            expr,
        });
    }
    text.push_str(&content[copied..]);

    // Inserting back to front keeps the earlier offsets valid.
    substitutions.reverse();

    Ok(StringLiteral {
        text,
        substitutions,
    })
}

fn is_operator(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Operator => true,
        TokenKind::Identifier => operators::is_keyword_operator(token.text),
        _ => false,
    }
}

fn op_precedence(token: &Token<'_>) -> u8 {
    operators::precedence(token.text).unwrap_or(u8::MAX)
}

/// Whether an operator at this index has an operand on its left.
fn in_binary_position(tokens: &[Token<'_>], index: usize) -> bool {
    if index == 0 {
        return false;
    }
    let prev = &tokens[index - 1];
    !(is_operator(prev) || prev.opens() || prev.is(TokenKind::Comma))
}

/// Index of the operator to split a span at, if any.
fn find_split(tokens: &[Token<'_>]) -> Option<usize> {
    let mut depth = 0usize;
    let mut best: Option<(usize, u8)> = None;

    for (i, token) in tokens.iter().enumerate() {
        if token.opens() {
            depth += 1;
        } else if token.closes() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && is_operator(token) && in_binary_position(tokens, i) {
            let p = op_precedence(token);
            let better = match best {
                None => true,
                Some((_, best_p)) if p < best_p => true,
                Some((_, best_p)) if p == best_p => !operators::is_right_associative(token.text),
                Some(_) => false,
            };
            if better {
                best = Some((i, p));
            }
        }
    }

    best.map(|(i, _)| i)
}

/// Index of the bracket closing the one at `open`.
fn matching_close(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.opens() {
            depth += 1;
        } else if token.closes() {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn split_commas<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<&'t [Token<'a>]> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        if token.opens() {
            depth += 1;
        } else if token.closes() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.is(TokenKind::Comma) {
            pieces.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    pieces.push(&tokens[start..]);
    pieces
}

/// Every bracket must be closed by its own kind, in order.
fn check_balance(tokens: &[Token<'_>]) -> Result<(), ParseError> {
    let mut stack: Vec<&Token<'_>> = Vec::new();
    for token in tokens {
        if token.opens() {
            stack.push(token);
        } else if token.closes() {
            let partner = match token.kind {
                TokenKind::RParen => TokenKind::LParen,
                _ => TokenKind::LBracket,
            };
            match stack.pop() {
                Some(open) if open.kind == partner => {}
                _ => {
                    return Err(ParseError::Unbalanced {
                        token: token.text.to_string(),
                        position: token.offset,
                    });
                }
            }
        }
    }
    match stack.pop() {
        Some(open) => Err(ParseError::Unbalanced {
            token: open.text.to_string(),
            position: open.offset,
        }),
        None => Ok(()),
    }
}

fn join_text(tokens: &[Token<'_>]) -> String {
    tokens.iter().map(|t| t.text).collect::<Vec<_>>().join(" ")
}

fn unparseable(tokens: &[Token<'_>]) -> ParseError {
    ParseError::Unparseable(join_text(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_reports_first_unmatched() {
        assert!(matches!(
            parse("foo("),
            Err(ParseError::Unbalanced { position: 3, .. })
        ));
        assert!(matches!(
            parse("(1]"),
            Err(ParseError::Unbalanced { position: 2, .. })
        ));
    }

    #[test]
    fn test_string_literal_offsets() {
        let lit = parse_string_literal("a{1}b{2}c").unwrap();
        assert_eq!(lit.text, "abc");
        let offsets: Vec<_> = lit.substitutions.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![2, 1]);
    }

    #[test]
    fn test_unclosed_brace_is_text() {
        let lit = parse_string_literal("50{% off").unwrap();
        assert_eq!(lit.text, "50{% off");
        assert!(lit.substitutions.is_empty());
    }

    #[test]
    fn test_binary_position() {
        let tokens = tokenize("2 * -3").unwrap();
        assert!(in_binary_position(&tokens, 1));
        assert!(!in_binary_position(&tokens, 2));
    }
}
