//! Attribute scopes that formulas are evaluated against.
//!
//! A [`Callable`] is anything that can answer "what is the value of `name`?"
//! for a formula. Host code implements it on adapters around its own
//! objects; the crate ships [`MapCallable`] for ad-hoc environments and the
//! evaluator builds its own scopes for `where` clauses and list built-ins.

use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::evaluator::EvalError;
use crate::value::Value;

/// How a formula may use an attribute reported by [`Callable::inputs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// One attribute exposed by a [`Callable`], for tooling and introspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormulaInput {
    pub name: String,
    pub access: AccessMode,
}

impl FormulaInput {
    pub fn new(name: impl Into<String>, access: AccessMode) -> Self {
        FormulaInput {
            name: name.into(),
            access,
        }
    }

    pub fn read_only(name: impl Into<String>) -> Self {
        Self::new(name, AccessMode::ReadOnly)
    }
}

/// Interface for objects that formulas can be run on.
///
/// # Contract
///
/// - [`get`](Callable::get) never fails: unknown names resolve to
///   `Value::Integer(0)` so formulas may probe attributes speculatively.
/// - [`query`](Callable::query) is what the evaluator calls. Scopes whose
///   lookups can themselves evaluate formula code (such as `where` scopes)
///   override it to surface evaluation errors; everyone else inherits the
///   default, which defers to `get`.
/// - [`set`](Callable::set) is optional. The default reports the write as
///   an error and drops it.
///
/// # Examples
///
/// ```
/// use formula_lang::{Callable, Formula, Value};
///
/// struct Character;
///
/// impl Callable for Character {
///     fn get(&self, key: &str) -> Value {
///         match key {
///             "strength" => Value::Integer(15),
///             "agility" => Value::Integer(12),
///             _ => Value::default(),
///         }
///     }
/// }
///
/// let formula = Formula::new("(strength + agility) / 2").unwrap();
/// assert_eq!(formula.execute(&Character), Value::Integer(13));
/// ```
pub trait Callable {
    /// Look up an attribute, returning `Integer(0)` for unknown names.
    fn get(&self, key: &str) -> Value;

    /// Fallible lookup used by the evaluator.
    fn query(&self, key: &str) -> Result<Value, EvalError> {
        Ok(self.get(key))
    }

    /// Write an attribute.
    fn set(&mut self, key: &str, value: Value) -> Result<(), EvalError> {
        let _ = value;
        tracing::error!(key, "cannot set key on object");
        Err(EvalError::ReadOnly {
            key: key.to_string(),
        })
    }

    /// Attributes this object exposes.
    fn inputs(&self) -> Vec<FormulaInput> {
        Vec::new()
    }

    /// Hook for built-ins that need the concrete type behind an object
    /// reference (for example `distance` and its locations).
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

/// A map-backed scope with an optional fallback consulted on misses.
///
/// # Examples
///
/// ```
/// use formula_lang::{Formula, MapCallable, Value};
///
/// let env = MapCallable::new()
///     .add("strength", 15)
///     .add("name", "Gorm");
///
/// let formula = Formula::new("'{name} lifts {strength * 2}'").unwrap();
/// assert_eq!(formula.execute(&env), Value::from("Gorm lifts 30"));
/// ```
#[derive(Default, Clone)]
pub struct MapCallable {
    values: BTreeMap<String, Value>,
    fallback: Option<Rc<dyn Callable>>,
}

impl MapCallable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope that defers unknown names to `fallback`.
    pub fn with_fallback(fallback: Rc<dyn Callable>) -> Self {
        MapCallable {
            values: BTreeMap::new(),
            fallback: Some(fallback),
        }
    }

    /// Builder-style insertion.
    pub fn add(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Callable for MapCallable {
    fn get(&self, key: &str) -> Value {
        match self.values.get(key) {
            Some(value) => value.clone(),
            None => match &self.fallback {
                Some(fallback) => fallback.get(key),
                None => Value::default(),
            },
        }
    }

    fn query(&self, key: &str) -> Result<Value, EvalError> {
        match self.values.get(key) {
            Some(value) => Ok(value.clone()),
            None => match &self.fallback {
                Some(fallback) => fallback.query(key),
                None => Ok(Value::default()),
            },
        }
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), EvalError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn inputs(&self) -> Vec<FormulaInput> {
        let mut inputs = match &self.fallback {
            Some(fallback) => fallback.inputs(),
            None => Vec::new(),
        };
        inputs.extend(
            self.values
                .keys()
                .map(|k| FormulaInput::new(k.clone(), AccessMode::ReadWrite)),
        );
        inputs
    }
}
