use crate::ast::{BinOp, Builtin, UnaryOp};

/// Expression tree node.
///
/// Trees are built once by the parser, owned by a [`crate::Formula`] and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// String literal, possibly with `{...}` substitutions
    ///
    /// # Example
    /// ```text
    /// 'hp: {hp}/{max_hp}'
    /// ```
    String(StringLiteral),

    /// List literal
    ///
    /// # Example
    /// ```text
    /// [1, 2, strength]
    /// ```
    List(Vec<Expr>),

    // References
    /// Attribute lookup in the current scope
    Identifier(String),

    // Operations
    /// Prefix operation (`not x`, `-x`)
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation (arithmetic, comparison, logical, dice)
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Member access
    ///
    /// When `object` is a list, `member` is evaluated in the current scope
    /// and used as an index; otherwise `member` is evaluated inside the
    /// object's attribute scope.
    ///
    /// # Examples
    /// ```text
    /// char.strength
    /// members.0
    /// ```
    Dot { object: Box<Expr>, member: Box<Expr> },

    /// Built-in function call
    ///
    /// # Example
    /// ```text
    /// if(strength > 12, 7, 2)
    /// ```
    Call { function: Builtin, args: Vec<Expr> },

    /// Body evaluated with local bindings
    ///
    /// # Example
    /// ```text
    /// x * 5 where x = 1
    /// ```
    Where {
        body: Box<Expr>,
        bindings: Vec<WhereBinding>,
    },
}

/// One `name = expression` binding of a `where` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereBinding {
    pub name: String,
    pub value: Expr,
}

/// A string literal with its substitutions removed from the text.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    /// Literal text with every `{...}` fragment cut out
    pub text: String,
    /// Substitutions in descending offset order
    pub substitutions: Vec<Substitution>,
}

/// A `{...}` fragment of a string literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    /// Byte offset in [`StringLiteral::text`] where the result is inserted
    pub offset: usize,
    pub expr: Expr,
}

impl StringLiteral {
    pub fn plain(text: impl Into<String>) -> Self {
        StringLiteral {
            text: text.into(),
            substitutions: Vec::new(),
        }
    }
}
