//! Scopes the evaluator builds on top of the caller's environment.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::{
    ast::WhereBinding,
    callable::{Callable, FormulaInput},
    evaluator::{EvalError, Evaluator},
    value::Value,
};

/// Scope for the body of a `where` clause.
///
/// Each binding is evaluated against the enclosing scope the first time the
/// body asks for it and the result is kept for the rest of this evaluation.
/// Names without a binding are looked up in the enclosing scope.
pub struct WhereScope<'e> {
    base: &'e dyn Callable,
    bindings: &'e [WhereBinding],
    evaluator: &'e Evaluator,
    cache: RefCell<HashMap<String, Value>>,
}

impl<'e> WhereScope<'e> {
    pub fn new(base: &'e dyn Callable, bindings: &'e [WhereBinding], evaluator: &'e Evaluator) -> Self {
        WhereScope {
            base,
            bindings,
            evaluator,
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl Callable for WhereScope<'_> {
    fn get(&self, key: &str) -> Value {
        self.query(key).unwrap_or_else(|err| {
            tracing::warn!(key, error = %err, "where binding failed to evaluate");
            Value::default()
        })
    }

    fn query(&self, key: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.cache.borrow().get(key) {
            return Ok(value.clone());
        }

        match self.bindings.iter().find(|b| b.name == key) {
            Some(binding) => {
                let value = self.evaluator.eval(&binding.value, self.base)?;
                self.cache
                    .borrow_mut()
                    .insert(key.to_string(), value.clone());
                Ok(value)
            }
            None => self.base.query(key),
        }
    }

    fn inputs(&self) -> Vec<FormulaInput> {
        let mut inputs: Vec<_> = self
            .bindings
            .iter()
            .map(|b| FormulaInput::read_only(b.name.clone()))
            .collect();
        inputs.extend(self.base.inputs());
        inputs
    }
}

/// A handful of named values layered over an enclosing scope.
///
/// List built-ins use it to expose the current element as `value` and the
/// `sort` comparator uses it for `a` and `b`.
pub struct BindingScope<'e> {
    names: Vec<(&'static str, Value)>,
    fallback: &'e dyn Callable,
}

impl<'e> BindingScope<'e> {
    pub fn new(fallback: &'e dyn Callable) -> Self {
        BindingScope {
            names: Vec::new(),
            fallback,
        }
    }

    pub fn bind(mut self, name: &'static str, value: Value) -> Self {
        self.names.push((name, value));
        self
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        self.names.iter().find(|(n, _)| *n == key).map(|(_, v)| v)
    }
}

impl Callable for BindingScope<'_> {
    fn get(&self, key: &str) -> Value {
        match self.lookup(key) {
            Some(value) => value.clone(),
            None => self.fallback.get(key),
        }
    }

    fn query(&self, key: &str) -> Result<Value, EvalError> {
        match self.lookup(key) {
            Some(value) => Ok(value.clone()),
            None => self.fallback.query(key),
        }
    }

    fn inputs(&self) -> Vec<FormulaInput> {
        let mut inputs: Vec<_> = self
            .names
            .iter()
            .map(|(n, _)| FormulaInput::read_only(*n))
            .collect();
        inputs.extend(self.fallback.inputs());
        inputs
    }
}
