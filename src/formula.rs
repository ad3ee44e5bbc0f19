//! Compiled formulas, the entry point for host code.

use std::fmt;

use crate::{
    ast::Expr,
    callable::{Callable, MapCallable},
    evaluator::{EvalError, Evaluator},
    parser::{ParseError, parse, parse_string_literal},
    value::Value,
};

thread_local! {
    static EVALUATOR: Evaluator = Evaluator::new();
}

/// A formula compiled from source text.
///
/// Compilation is all-or-nothing: either the whole source parses into a
/// formula or a [`ParseError`] is returned. A formula is immutable and can
/// be executed any number of times against different environments.
///
/// # Examples
///
/// ```
/// use formula_lang::{Formula, MapCallable, Value};
///
/// let formula = Formula::new("if(strength > 12, 7, 2)").unwrap();
///
/// let strong = MapCallable::new().add("strength", 15);
/// let weak = MapCallable::new().add("strength", 9);
/// assert_eq!(formula.execute(&strong), Value::Integer(7));
/// assert_eq!(formula.execute(&weak), Value::Integer(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Compiles formula source text.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        match parse(source) {
            Ok(expr) => {
                tracing::debug!(source, "compiled formula");
                Ok(Formula {
                    source: source.to_string(),
                    expr,
                })
            }
            Err(err) => {
                tracing::error!(source, error = %err, "failed to compile formula");
                Err(err)
            }
        }
    }

    /// Compiles a whole text as the body of a string literal, so that
    /// `{...}` fragments are substituted and everything else is kept as is.
    ///
    /// ```
    /// use formula_lang::{Formula, MapCallable, Value};
    ///
    /// let formula = Formula::string_formula("Your strength is {strength}").unwrap();
    /// let env = MapCallable::new().add("strength", 15);
    /// assert_eq!(formula.execute(&env), Value::from("Your strength is 15"));
    /// ```
    pub fn string_formula(text: &str) -> Result<Self, ParseError> {
        let literal = parse_string_literal(text).inspect_err(|err| {
            tracing::error!(text, error = %err, "failed to compile string formula");
        })?;
        Ok(Formula {
            source: text.to_string(),
            expr: Expr::String(literal),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Runs the formula, degrading any evaluation error to
    /// `Value::Integer(0)` after logging it.
    pub fn execute(&self, env: &dyn Callable) -> Value {
        EVALUATOR.with(|evaluator| self.execute_in(evaluator, env))
    }

    /// Runs the formula and reports evaluation errors to the caller.
    pub fn try_execute(&self, env: &dyn Callable) -> Result<Value, EvalError> {
        EVALUATOR.with(|evaluator| self.try_execute_in(evaluator, env))
    }

    /// Like [`execute`](Formula::execute), with an explicit evaluator.
    pub fn execute_in(&self, evaluator: &Evaluator, env: &dyn Callable) -> Value {
        self.try_execute_in(evaluator, env).unwrap_or_else(|err| {
            tracing::warn!(source = %self.source, error = %err, "formula evaluation failed");
            Value::default()
        })
    }

    pub fn try_execute_in(&self, evaluator: &Evaluator, env: &dyn Callable) -> Result<Value, EvalError> {
        evaluator.eval(&self.expr, env)
    }

    /// Runs the formula with nothing in scope.
    pub fn execute_empty(&self) -> Value {
        self.execute(&MapCallable::new())
    }

    /// Runs an optional formula, or returns `default` when there is none.
    pub fn evaluate(formula: Option<&Formula>, env: &dyn Callable, default: Value) -> Value {
        match formula {
            Some(formula) => formula.execute(env),
            None => default,
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compiles formula source text.
pub fn compile(source: &str) -> Result<Formula, ParseError> {
    Formula::new(source)
}

/// Compiles an optional formula from configuration.
///
/// Blank source means "no formula". Source that fails to compile is logged
/// and also treated as no formula.
pub fn compile_optional(source: &str) -> Option<Formula> {
    if source.trim().is_empty() {
        return None;
    }
    Formula::new(source).ok()
}
