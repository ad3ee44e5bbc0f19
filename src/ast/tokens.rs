/// Kinds of lexical tokens.
///
/// Keyword operators (`and`, `or`, `not`, `where`, `d`) are lexed as
/// [`Identifier`](TokenKind::Identifier)s and reclassified by the parser
/// based on their spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Name made of letters, digits and underscores, not starting with a digit
    ///
    /// # Examples
    /// ```text
    /// strength
    /// max_hp
    /// _tmp
    /// ```
    Identifier,

    /// Decimal integer literal
    ///
    /// # Examples
    /// ```text
    /// 0
    /// 42
    /// ```
    Integer,

    /// Single-quoted string literal, quotes included in the token text
    ///
    /// # Examples
    /// ```text
    /// 'hello'
    /// 'hp: {hp}'
    /// ```
    StringLiteral,

    /// Symbolic operator
    ///
    /// One of `+ - * / % ^ < > <= >= != = .`
    Operator,

    /// Left parenthesis
    LParen,

    /// Right parenthesis
    RParen,

    /// Left bracket for list literals
    LBracket,

    /// Right bracket
    RBracket,

    /// Comma separating arguments, list elements and `where` bindings
    Comma,

    /// Run of whitespace, dropped by [`crate::lexer::tokenize`]
    Whitespace,

    /// End of input
    Eof,
}

/// A token: its kind plus the slice of source text it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the token in the source
    pub offset: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, offset: usize) -> Self {
        Token { kind, text, offset }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Opening parenthesis or bracket
    pub fn opens(&self) -> bool {
        matches!(self.kind, TokenKind::LParen | TokenKind::LBracket)
    }

    /// Closing parenthesis or bracket
    pub fn closes(&self) -> bool {
        matches!(self.kind, TokenKind::RParen | TokenKind::RBracket)
    }
}
