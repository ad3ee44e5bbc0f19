//! JSON <-> formula value conversion.
//!
//! JSON objects become [`JsonObject`]s, which formulas read attributes from
//! like any other object:
//!
//! ```
//! use formula_lang::json::json_to_value;
//! use formula_lang::{Formula, MapCallable, Value};
//!
//! let doc = serde_json::json!({ "hero": { "name": "Ilsa", "hp": 12 } });
//! let env = MapCallable::new().add("doc", json_to_value(doc));
//!
//! let formula = Formula::new("doc.hero.hp * 2").unwrap();
//! assert_eq!(formula.execute(&env), Value::Integer(24));
//! ```

use std::any::Any;

use serde_json::Map;

use crate::{
    callable::{Callable, FormulaInput},
    evaluator::EvalError,
    value::Value,
};

/// A JSON object exposed as a read-only attribute scope.
#[derive(Debug, Clone, Default)]
pub struct JsonObject {
    fields: Map<String, serde_json::Value>,
}

impl JsonObject {
    pub fn new(fields: Map<String, serde_json::Value>) -> Self {
        JsonObject { fields }
    }

    pub fn fields(&self) -> &Map<String, serde_json::Value> {
        &self.fields
    }
}

impl Callable for JsonObject {
    fn get(&self, key: &str) -> Value {
        self.fields
            .get(key)
            .map(|v| json_to_value(v.clone()))
            .unwrap_or_default()
    }

    fn inputs(&self) -> Vec<FormulaInput> {
        self.fields.keys().map(FormulaInput::read_only).collect()
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

/// Convert a JSON document to a formula value.
///
/// Formulas only know integers, so `null` and `false` become 0, `true`
/// becomes 1 and fractional numbers are truncated.
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::default(),
        serde_json::Value::Bool(b) => Value::from(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Integer(n.as_f64().map_or(0, |f| f as i64)),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => Value::object(JsonObject::new(obj)),
    }
}

/// Convert a formula value to JSON. Objects other than [`JsonObject`]s have
/// no JSON form.
pub fn value_to_json(v: &Value) -> Result<serde_json::Value, EvalError> {
    match v {
        Value::Integer(i) => Ok(serde_json::Value::Number((*i).into())),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::List(items) => items
            .iter()
            .map(value_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(serde_json::Value::Array),
        Value::Object(obj) => obj
            .as_any()
            .and_then(|any| any.downcast_ref::<JsonObject>())
            .map(|json| serde_json::Value::Object(json.fields.clone()))
            .ok_or(EvalError::NotSerializable("object")),
    }
}
