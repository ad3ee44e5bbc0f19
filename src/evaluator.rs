use std::cell::RefCell;
use std::cmp::Ordering;

use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, StringLiteral, UnaryOp},
    callable::Callable,
    scope::WhereScope,
    value::Value,
};

/// Errors that can occur during formula evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Operand or argument of the wrong kind
    #[error("type error in {context}: expected {expected}, got {got}")]
    TypeError {
        expected: String,
        got: String,
        context: String,
    },

    /// List index outside the list
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// Division or modulo by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Integer result outside the 64-bit range
    #[error("integer overflow in '{0}'")]
    Overflow(&'static str),

    /// Argument of the right kind but an unusable value
    #[error("invalid argument to {function}: {reason}")]
    InvalidArgument {
        function: &'static str,
        reason: String,
    },

    /// Write to an object that does not accept writes
    #[error("cannot set '{key}' on a read-only object")]
    ReadOnly { key: String },

    /// Value with no formula source representation
    #[error("{0} values cannot be serialized")]
    NotSerializable(&'static str),
}

impl EvalError {
    pub fn type_error(expected: &str, got: &Value, context: &str) -> Self {
        EvalError::TypeError {
            expected: expected.to_string(),
            got: got.type_name().to_string(),
            context: context.to_string(),
        }
    }
}

/// Tree-walking evaluator.
///
/// The evaluator holds no per-formula state. Its only state is the random
/// source for dice rolls, which hosts seed with [`Evaluator::with_seed`] when
/// they need reproducible results.
///
/// # Examples
///
/// ```
/// use formula_lang::{Evaluator, MapCallable, Value};
/// use formula_lang::parser::parse;
///
/// let evaluator = Evaluator::with_seed(7);
/// let expr = parse("x * 5 where x = 1").unwrap();
/// let result = evaluator.eval(&expr, &MapCallable::new()).unwrap();
/// assert_eq!(result, Value::Integer(5));
/// ```
pub struct Evaluator {
    rng: RefCell<StdRng>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Creates an evaluator whose dice are seeded from system entropy.
    pub fn new() -> Self {
        Evaluator {
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }

    /// Creates an evaluator with deterministic dice.
    pub fn with_seed(seed: u64) -> Self {
        Evaluator {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Evaluates an expression tree against an environment.
    pub fn eval(&self, expr: &Expr, env: &dyn Callable) -> Result<Value, EvalError> {
        match expr {
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::String(literal) => self.eval_string(literal, env),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item, env))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Identifier(name) => env.query(name),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, env)?;
                apply_unary(*op, &value)
            }
            Expr::Binary { op, left, right } => {
                let lhs = self.eval(left, env)?;
                let rhs = self.eval(right, env)?;
                self.apply_binop(*op, &lhs, &rhs)
            }
            Expr::Dot { object, member } => self.eval_dot(object, member, env),
            Expr::Call { function, args } => self.call_builtin(*function, args, env),
            Expr::Where { body, bindings } => {
                let scope = WhereScope::new(env, bindings, self);
                self.eval(body, &scope)
            }
        }
    }

    fn eval_string(&self, literal: &StringLiteral, env: &dyn Callable) -> Result<Value, EvalError> {
        let mut text = literal.text.clone();
        // Substitutions are stored back to front.
        for sub in &literal.substitutions {
            let value = self.eval(&sub.expr, env)?;
            text.insert_str(sub.offset, &value.to_string());
        }
        Ok(Value::String(text))
    }

    /// `list.index` indexes with `index` evaluated in the current scope;
    /// `object.expr` evaluates `expr` inside the object.
    fn eval_dot(&self, object: &Expr, member: &Expr, env: &dyn Callable) -> Result<Value, EvalError> {
        let target = self.eval(object, env)?;
        match &target {
            Value::List(_) => {
                let index = self.eval(member, env)?;
                let index = index
                    .as_int()
                    .map_err(|_| EvalError::type_error("integer", &index, "list index"))?;
                target.element(index).cloned()
            }
            Value::Object(obj) => self.eval(member, &**obj),
            other => Err(EvalError::type_error("list or object", other, "member access")),
        }
    }

    fn apply_binop(&self, op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        match op {
            BinOp::Or => Ok(Value::from(left.as_bool()? | right.as_bool()?)),
            BinOp::And => Ok(Value::from(left.as_bool()? & right.as_bool()?)),
            BinOp::Equal => left.formula_eq(right).map(Value::from),
            BinOp::NotEqual => left.formula_eq(right).map(|eq| Value::from(!eq)),
            BinOp::LessThan => compare(left, right, |o| o == Ordering::Less),
            BinOp::GreaterThan => compare(left, right, |o| o == Ordering::Greater),
            BinOp::LessEqual => compare(left, right, |o| o != Ordering::Greater),
            BinOp::GreaterEqual => compare(left, right, |o| o != Ordering::Less),
            BinOp::Add => arithmetic(op, left, right, i64::checked_add),
            BinOp::Subtract => arithmetic(op, left, right, i64::checked_sub),
            BinOp::Multiply => arithmetic(op, left, right, i64::checked_mul),
            BinOp::Divide => divide(op, left, right, i64::checked_div),
            BinOp::Modulo => divide(op, left, right, i64::checked_rem),
            BinOp::Power => {
                let (base, exp) = int_operands(op, left, right)?;
                power(base, exp).map(Value::Integer)
            }
            BinOp::Dice => {
                let (count, faces) = int_operands(op, left, right)?;
                self.roll_dice(count, faces).map(Value::Integer)
            }
        }
    }

    /// Sum of `count` uniform draws from `1..=faces`. Non-positive counts or
    /// face numbers roll nothing.
    fn roll_dice(&self, count: i64, faces: i64) -> Result<i64, EvalError> {
        if count <= 0 || faces <= 0 {
            return Ok(0);
        }
        let mut rng = self.rng.borrow_mut();
        let mut total: i64 = 0;
        for _ in 0..count {
            total = total
                .checked_add(rng.gen_range(1..=faces))
                .ok_or(EvalError::Overflow("d"))?;
        }
        tracing::trace!(count, faces, total, "rolled dice");
        Ok(total)
    }
}

fn apply_unary(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::from(!value.as_bool()?)),
        UnaryOp::Negate => {
            let n = value
                .as_int()
                .map_err(|_| EvalError::type_error("integer", value, "unary '-'"))?;
            n.checked_neg()
                .map(Value::Integer)
                .ok_or(EvalError::Overflow("-"))
        }
    }
}

fn int_operands(op: BinOp, left: &Value, right: &Value) -> Result<(i64, i64), EvalError> {
    let context = format!("operator '{}'", op.symbol());
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok((*a, *b)),
        (Value::Integer(_), other) | (other, _) => {
            Err(EvalError::type_error("integer", other, &context))
        }
    }
}

fn arithmetic(
    op: BinOp,
    left: &Value,
    right: &Value,
    f: fn(i64, i64) -> Option<i64>,
) -> Result<Value, EvalError> {
    let (a, b) = int_operands(op, left, right)?;
    f(a, b)
        .map(Value::Integer)
        .ok_or(EvalError::Overflow(op.symbol()))
}

fn divide(
    op: BinOp,
    left: &Value,
    right: &Value,
    f: fn(i64, i64) -> Option<i64>,
) -> Result<Value, EvalError> {
    let (a, b) = int_operands(op, left, right)?;
    if b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    f(a, b)
        .map(Value::Integer)
        .ok_or(EvalError::Overflow(op.symbol()))
}

fn compare(
    left: &Value,
    right: &Value,
    test: impl Fn(Ordering) -> bool,
) -> Result<Value, EvalError> {
    left.compare(right).map(|o| Value::from(test(o)))
}

/// Integer power with the truncation a real-valued power would give:
/// negative exponents produce 0 except for bases of magnitude 1.
fn power(base: i64, exp: i64) -> Result<i64, EvalError> {
    if exp >= 0 {
        let exp = u32::try_from(exp).map_err(|_| EvalError::Overflow("^"))?;
        return base.checked_pow(exp).ok_or(EvalError::Overflow("^"));
    }
    match base {
        0 => Err(EvalError::DivisionByZero),
        1 => Ok(1),
        -1 => Ok(if exp % 2 == 0 { 1 } else { -1 }),
        _ => Ok(0),
    }
}
