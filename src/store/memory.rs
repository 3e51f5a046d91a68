//! In-memory data store

use std::collections::HashMap;

use crate::core::Record;
use crate::schema::ModelDef;
use crate::store::{check_unique_ids, DataStore, StoreError};

/// Tables held in memory, keyed by model label
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table for `label` (`app.Model`), replacing any existing one
    pub fn with_table(mut self, label: &str, records: Vec<Record>) -> Self {
        self.tables.insert(label.to_string(), records);
        self
    }

    pub fn table(&self, label: &str) -> &[Record] {
        self.tables.get(label).map(|t| t.as_slice()).unwrap_or(&[])
    }
}

impl DataStore for MemoryStore {
    fn load(&self, model: &ModelDef) -> Result<Vec<Record>, StoreError> {
        let records = self.table(&model.label()).to_vec();
        check_unique_ids(model, &records)?;
        Ok(records)
    }

    fn save(&mut self, model: &ModelDef, records: &[Record]) -> Result<(), StoreError> {
        self.tables.insert(model.label(), records.to_vec());
        Ok(())
    }
}
