use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::callable::Callable;
use crate::evaluator::EvalError;

/// A value produced by formula evaluation.
///
/// The set of kinds is closed: every formula evaluates to an integer, a
/// string, a list, or a reference to a host object exposing attributes
/// through [`Callable`].
///
/// # Null value
///
/// There is no dedicated null kind. `Integer(0)` doubles as the null value:
/// it is what [`Value::default`] returns, what unknown attributes resolve
/// to, and what a failed [`crate::Formula::execute`] degrades to.
///
/// # Examples
///
/// ```
/// use formula_lang::Value;
///
/// let n = Value::Integer(42);
/// let s = Value::from("hello");
/// let list = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
///
/// assert_eq!(Value::default(), Value::Integer(0));
/// assert_eq!(list.to_string(), "1, 2");
/// assert_eq!(s.to_string(), "hello");
/// assert!(n.as_bool().unwrap());
/// ```
#[derive(Clone)]
pub enum Value {
    /// Signed integer, also the null-like default
    Integer(i64),

    /// Owned UTF-8 string
    String(String),

    /// Ordered, heterogeneous list of values
    List(Vec<Value>),

    /// Shared handle to a host object
    ///
    /// The value never owns the object exclusively; the host keeps its own
    /// handle and the object is kept alive for as long as any value
    /// derived from it exists.
    Object(Rc<dyn Callable>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Integer(0)
    }
}

impl Value {
    /// Wrap a host object.
    pub fn object<C: Callable + 'static>(callable: C) -> Self {
        Value::Object(Rc::new(callable))
    }

    /// Human-readable kind name, used in type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Boolean coercion. Only integers have a truth value.
    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Integer(n) => Ok(*n != 0),
            other => Err(EvalError::type_error("integer", other, "boolean condition")),
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Result<i64, EvalError> {
        match self {
            Value::Integer(n) => Ok(*n),
            other => Err(EvalError::type_error("integer", other, "integer operand")),
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Result<&str, EvalError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(EvalError::type_error("string", other, "string operand")),
        }
    }

    /// Borrow the elements of a list value
    pub fn as_list(&self) -> Result<&[Value], EvalError> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(EvalError::type_error("list", other, "list operand")),
        }
    }

    /// Borrow the object behind an object reference
    pub fn as_callable(&self) -> Result<&Rc<dyn Callable>, EvalError> {
        match self {
            Value::Object(obj) => Ok(obj),
            other => Err(EvalError::type_error("object", other, "attribute access")),
        }
    }

    /// Index into a list value. Negative or too-large indices fail.
    pub fn element(&self, index: i64) -> Result<&Value, EvalError> {
        let items = self.as_list()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .ok_or(EvalError::IndexOutOfRange {
                index,
                len: items.len(),
            })
    }

    /// Formula equality (`=`): defined only between values of the same kind.
    pub fn formula_eq(&self, other: &Value) -> Result<bool, EvalError> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(a == b),
            (Value::String(a), Value::String(b)) => Ok(a == b),
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.formula_eq(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Object(a), Value::Object(b)) => Ok(Rc::ptr_eq(a, b)),
            (a, b) => Err(EvalError::type_error(a.type_name(), b, "equality")),
        }
    }

    /// Natural ordering used by comparisons, `sort`, `choose`, `min` and `max`.
    ///
    /// Integers compare numerically, strings lexically and lists
    /// element by element. Objects and mixed kinds have no ordering.
    pub fn compare(&self, other: &Value) -> Result<Ordering, EvalError> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        unequal => return Ok(unequal),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            (Value::Object(_), _) | (_, Value::Object(_)) => Err(EvalError::TypeError {
                expected: "integer, string or list".to_string(),
                got: "object".to_string(),
                context: "ordering".to_string(),
            }),
            (a, b) => Err(EvalError::type_error(a.type_name(), b, "ordering")),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Integer(i64::from(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Structural equality for host code and tests.
///
/// Unlike [`Value::formula_eq`] this never fails: values of different
/// kinds are simply unequal, and objects are equal when they are the same
/// object.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(obj) => write!(f, "Object({:p})", Rc::as_ptr(obj)),
        }
    }
}

/// The "string cast" of a value, used by string interpolation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("(object)"),
        }
    }
}
