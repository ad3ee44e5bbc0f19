//! # Formula Language - Abstract Syntax Tree
//!
//! This module defines the tokens and expression tree of the formula
//! language, a small dynamically-typed expression language used to
//! parameterize game behavior (AI decisions, event filters, stat
//! computations, color and light transitions) without recompiling.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, lookups, operations, calls)
//! - **[operators]** - Unary and binary operators plus the precedence table
//! - **[functions]** - The fixed built-in function table
//!
//! ## Quick Start
//!
//! ```text
//! if(strength > 12, 7, 2)
//! ```
//!
//! Evaluates to `7` for a character whose `strength` is above 12.
//!
//! ## Core Concepts
//!
//! ### Operator precedence
//!
//! From loosest to tightest: `not`, `where`, `or`, `and`, comparisons
//! (`= != < > <= >=`), `+ -`, `*`, `/`, `%`, `^`, `d`, `.`.
//!
//! ### Scopes
//!
//! Identifiers resolve against the scope the formula is executed in. A
//! `where` clause adds local bindings; `a.b` evaluates `b` inside the
//! object `a`.
//!
//! ## Examples
//!
//! ```text
//! x * (a * b where a = 2, b = 1) where x = 5
//! choose(members, strength).strength
//! filter([1, 2, 3, 4], value % 2 = 0)
//! 'hi {1 + 1}'
//! 3d6
//! ```
pub mod expressions;
pub mod functions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, StringLiteral, Substitution, WhereBinding};
pub use functions::{Arity, Builtin};
pub use operators::{BinOp, UnaryOp};
pub use tokens::{Token, TokenKind};
