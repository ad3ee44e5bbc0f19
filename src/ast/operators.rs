/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Logical
    /// Logical OR (`or`), both sides always evaluated
    Or,
    /// Logical AND (`and`), both sides always evaluated
    And,

    // Comparison
    /// Equal (`=`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,

    // Arithmetic
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Modulo (`%`)
    Modulo,
    /// Exponentiation (`^`)
    Power,
    /// Dice roll (`d`): `3d6` rolls three six-sided dice
    Dice,
}

impl BinOp {
    pub fn from_spelling(op: &str) -> Option<BinOp> {
        let op = match op {
            "or" => BinOp::Or,
            "and" => BinOp::And,
            "=" => BinOp::Equal,
            "!=" => BinOp::NotEqual,
            "<" => BinOp::LessThan,
            ">" => BinOp::GreaterThan,
            "<=" => BinOp::LessEqual,
            ">=" => BinOp::GreaterEqual,
            "+" => BinOp::Add,
            "-" => BinOp::Subtract,
            "*" => BinOp::Multiply,
            "/" => BinOp::Divide,
            "%" => BinOp::Modulo,
            "^" => BinOp::Power,
            "d" => BinOp::Dice,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Equal => "=",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
            BinOp::Power => "^",
            BinOp::Dice => "d",
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation (`not`)
    Not,
    /// Arithmetic negation (`-`)
    Negate,
}

impl UnaryOp {
    pub fn from_spelling(op: &str) -> Option<UnaryOp> {
        match op {
            "not" => Some(UnaryOp::Not),
            "-" => Some(UnaryOp::Negate),
            _ => None,
        }
    }
}

/// Binding strength of every operator spelling, loosest first.
///
/// Operators sharing a number share a precedence band.
const PRECEDENCE: &[(&str, u8)] = &[
    ("not", 1),
    ("where", 2),
    ("or", 3),
    ("and", 4),
    ("=", 5),
    ("!=", 5),
    ("<", 5),
    (">", 5),
    ("<=", 5),
    (">=", 5),
    ("+", 6),
    ("-", 6),
    ("*", 7),
    ("/", 8),
    ("%", 9),
    ("^", 10),
    ("d", 11),
    (".", 12),
];

/// Precedence of an operator spelling, or `None` if it is not an operator.
pub fn precedence(op: &str) -> Option<u8> {
    PRECEDENCE
        .iter()
        .find(|(spelling, _)| *spelling == op)
        .map(|(_, p)| *p)
}

/// Identifiers that act as operators.
pub fn is_keyword_operator(word: &str) -> bool {
    matches!(word, "not" | "where" | "or" | "and" | "d")
}

/// Operators whose same-precedence chains group to the right.
pub fn is_right_associative(op: &str) -> bool {
    op == "^"
}
