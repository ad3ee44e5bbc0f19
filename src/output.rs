//! Serialization of values back to formula source.
//!
//! A serialized value is itself a formula: compiling and executing it with
//! an empty environment reproduces the value.
//!
//! # Examples
//!
//! ```
//! use formula_lang::Value;
//! use formula_lang::output::{from_formula_source, to_formula_source};
//!
//! let value = Value::List(vec![Value::Integer(1), Value::from("two")]);
//! let source = to_formula_source(&value).unwrap();
//! assert_eq!(source, "[1,'two']");
//! assert_eq!(from_formula_source(&source).unwrap(), value);
//! ```

use thiserror::Error;

use crate::{
    callable::MapCallable,
    evaluator::EvalError,
    formula::Formula,
    parser::ParseError,
    value::Value,
};

/// Errors from reading a value back out of formula source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Formula source that evaluates to `value`.
///
/// Objects have no source form. Nor do strings containing a quote or a
/// brace, since string literals have no escapes.
pub fn to_formula_source(value: &Value) -> Result<String, EvalError> {
    let mut out = String::new();
    write_value(value, &mut out)?;
    Ok(out)
}

fn write_value(value: &Value, out: &mut String) -> Result<(), EvalError> {
    match value {
        // The literal 9223372036854775808 is out of range, so the minimum
        // has to be written as arithmetic.
        Value::Integer(i64::MIN) => out.push_str("(-9223372036854775807-1)"),
        Value::Integer(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            if s.contains(['\'', '{']) {
                return Err(EvalError::NotSerializable("quote or brace in string"));
            }
            out.push('\'');
            out.push_str(s);
            out.push('\'');
        }
        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Object(_) => return Err(EvalError::NotSerializable("object")),
    }
    Ok(())
}

/// Compile `source` and execute it with nothing in scope.
pub fn from_formula_source(source: &str) -> Result<Value, ReadError> {
    let formula = Formula::new(source)?;
    Ok(formula.try_execute(&MapCallable::new())?)
}
