pub mod ast;
mod builtins;
pub mod callable;
pub mod evaluator;
pub mod formula;
pub mod hex;
pub mod json;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod registry;
pub mod scope;
pub mod value;

pub use ast::{BinOp, Builtin, Expr, Token, UnaryOp};
pub use callable::{AccessMode, Callable, FormulaInput, MapCallable};
pub use evaluator::{EvalError, Evaluator};
pub use formula::{Formula, compile, compile_optional};
pub use hex::Location;
pub use lexer::{LexError, Lexer, tokenize};
pub use output::{from_formula_source, to_formula_source};
pub use parser::{ParseError, Parser, parse};
pub use registry::{FormulaRegistry, RegistryError};
pub use value::Value;
