//! Record - one row of a model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored row: primary key plus field values by name
///
/// Foreign keys hold the id of the related record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,

    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl Record {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            values: Map::new(),
        }
    }

    /// Builder-style setter, mostly for fixtures
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    /// Value of a field, `Null` when the row doesn't carry it
    pub fn get(&self, field: &str) -> &Value {
        self.values.get(field).unwrap_or(&Value::Null)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }

    /// Id stored in a foreign key field, if any
    pub fn foreign_id(&self, field: &str) -> Option<u64> {
        match self.get(field) {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
