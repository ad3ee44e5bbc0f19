use thiserror::Error;

use crate::ast::{Token, TokenKind};

/// Errors that can occur while splitting source text into tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A character that cannot start any token
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    /// A string literal without its closing quote
    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: usize },
}

/// Converts formula source text into a stream of tokens.
///
/// The lexer keeps no state beyond its position in the input; whitespace is
/// returned as [`TokenKind::Whitespace`] tokens and dropped by
/// [`tokenize`].
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input[self.position..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += ch.len_utf8();
        }
    }

    fn token_from(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token::new(kind, &self.input[start..self.position], start)
    }

    fn read_whitespace(&mut self) -> Token<'a> {
        let start = self.position;
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.token_from(TokenKind::Whitespace, start)
    }

    fn read_identifier(&mut self) -> Token<'a> {
        let start = self.position;

        // `d` standing alone in front of a non-word character is the dice
        // operator, so `3d6` splits into `3`, `d`, `6`.
        if self.current_char() == Some('d')
            && !self.peek_char(1).is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            self.advance();
            return self.token_from(TokenKind::Identifier, start);
        }

        while self
            .current_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        self.token_from(TokenKind::Identifier, start)
    }

    fn read_number(&mut self) -> Token<'a> {
        let start = self.position;
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        self.token_from(TokenKind::Integer, start)
    }

    /// Read a single-quoted string. No escape processing is done; the token
    /// text keeps both quotes.
    fn read_string(&mut self) -> Result<Token<'a>, LexError> {
        let start = self.position;
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == '\'' {
                return Ok(self.token_from(TokenKind::StringLiteral, start));
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn single(&mut self, kind: TokenKind) -> Token<'a> {
        let start = self.position;
        self.advance();
        self.token_from(kind, start)
    }

    /// An operator that may be followed by `=` to form a two-character one.
    fn maybe_with_eq(&mut self) -> Token<'a> {
        let start = self.position;
        self.advance();
        if self.current_char() == Some('=') {
            self.advance();
        }
        self.token_from(TokenKind::Operator, start)
    }

    pub fn next_token(&mut self) -> Result<Token<'a>, LexError> {
        let token = match self.current_char() {
            None => Token::new(TokenKind::Eof, "", self.position),
            Some(ch) if ch.is_whitespace() => self.read_whitespace(),
            Some('(') => self.single(TokenKind::LParen),
            Some(')') => self.single(TokenKind::RParen),
            Some('[') => self.single(TokenKind::LBracket),
            Some(']') => self.single(TokenKind::RBracket),
            Some(',') => self.single(TokenKind::Comma),
            Some('+' | '-' | '*' | '/' | '%' | '^' | '=' | '.') => {
                self.single(TokenKind::Operator)
            }
            Some('<' | '>') => self.maybe_with_eq(),
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.maybe_with_eq()
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch: '!',
                        position: self.position,
                    });
                }
            }
            Some('\'') => self.read_string()?,
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.read_identifier(),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    position: self.position,
                });
            }
        };
        Ok(token)
    }
}

/// Split `text` into tokens, dropping whitespace and the end marker.
///
/// # Examples
///
/// ```
/// use formula_lang::ast::TokenKind;
/// use formula_lang::lexer::tokenize;
///
/// let tokens = tokenize("3d6 + bonus").unwrap();
/// let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
/// assert_eq!(texts, ["3", "d", "6", "+", "bonus"]);
/// assert_eq!(tokens[1].kind, TokenKind::Identifier);
/// ```
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        match token.kind {
            TokenKind::Eof => break,
            TokenKind::Whitespace => continue,
            _ => tokens.push(token),
        }
    }
    Ok(tokens)
}
