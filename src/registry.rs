//! Named tables of formulas loaded from JSON configuration.
//!
//! Game data keeps formulas as strings next to the rest of its
//! configuration. A registry document maps keys to formula source; string
//! members at the top level go into the default table and object members
//! become named tables:
//!
//! ```
//! use formula_lang::{FormulaRegistry, MapCallable, Value};
//!
//! let registry = FormulaRegistry::from_json(r#"{
//!     "max_hp": "10 + constitution * 2",
//!     "penalties": { "swamp": "3", "forest": "if(ranger, 0, 1)" }
//! }"#).unwrap();
//!
//! let pc = MapCallable::new().add("constitution", 4).add("ranger", 1);
//! let max_hp = registry.get_default("max_hp").unwrap();
//! assert_eq!(max_hp.execute(&pc), Value::Integer(18));
//! assert_eq!(registry.get("penalties", "forest").unwrap().execute(&pc), Value::Integer(0));
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{formula::Formula, parser::ParseError};

/// Name of the table that top-level string entries are loaded into.
pub const DEFAULT_TABLE: &str = "";

/// Errors that can occur while loading a registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The document is not valid JSON
    #[error("invalid registry document: {0}")]
    Json(#[from] serde_json::Error),

    /// An entry failed to compile
    #[error("formula '{key}' in table '{table}' failed to compile: {source}")]
    Formula {
        table: String,
        key: String,
        source: ParseError,
    },

    /// An entry is neither a formula string nor a table of them
    #[error("registry entry '{0}' must be a formula string or a table of formula strings")]
    Shape(String),
}

/// Formulas grouped into named tables.
#[derive(Debug, Clone, Default)]
pub struct FormulaRegistry {
    tables: BTreeMap<String, BTreeMap<String, Formula>>,
}

impl FormulaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and compile every formula in a JSON document.
    pub fn from_json(text: &str) -> Result<Self, RegistryError> {
        let doc: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Object(members) = doc else {
            return Err(RegistryError::Shape("<root>".to_string()));
        };

        let mut registry = FormulaRegistry::new();
        for (name, member) in members {
            match member {
                serde_json::Value::String(source) => {
                    registry.insert(DEFAULT_TABLE, &name, &source)?;
                }
                serde_json::Value::Object(entries) => {
                    for (key, entry) in entries {
                        let serde_json::Value::String(source) = entry else {
                            return Err(RegistryError::Shape(format!("{name}.{key}")));
                        };
                        registry.insert(&name, &key, &source)?;
                    }
                }
                _ => return Err(RegistryError::Shape(name)),
            }
        }

        tracing::debug!(tables = registry.tables.len(), "loaded formula registry");
        Ok(registry)
    }

    /// Compile `source` and store it under `table`/`key`, replacing any
    /// previous entry.
    pub fn insert(&mut self, table: &str, key: &str, source: &str) -> Result<(), RegistryError> {
        let formula = Formula::new(source).map_err(|source| RegistryError::Formula {
            table: table.to_string(),
            key: key.to_string(),
            source,
        })?;
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), formula);
        Ok(())
    }

    pub fn get(&self, table: &str, key: &str) -> Option<&Formula> {
        self.tables.get(table)?.get(key)
    }

    pub fn get_default(&self, key: &str) -> Option<&Formula> {
        self.get(DEFAULT_TABLE, key)
    }

    /// Names of the tables holding at least one formula, the default table
    /// included.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Keys of one table.
    pub fn keys(&self, table: &str) -> impl Iterator<Item = &str> {
        self.tables
            .get(table)
            .into_iter()
            .flat_map(|entries| entries.keys().map(String::as_str))
    }
}
