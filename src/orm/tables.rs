//! Per-evaluation cache of loaded model tables

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::core::Record;
use crate::orm::QueryError;
use crate::schema::{ModelDef, ModelRegistry, ReverseRelation};
use crate::store::DataStore;

/// Records of one model with an id index
#[derive(Debug, Default)]
pub struct Table {
    pub records: Vec<Record>,
    by_id: HashMap<u64, usize>,
}

impl Table {
    fn new(records: Vec<Record>) -> Self {
        let by_id = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();
        Self { records, by_id }
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.by_id.get(&id).map(|&i| &self.records[i])
    }
}

/// Lazily loads each model's table once and answers relation lookups
pub struct Tables<'a> {
    registry: &'a dyn ModelRegistry,
    store: &'a dyn DataStore,
    loaded: RefCell<HashMap<String, Rc<Table>>>,
}

impl<'a> Tables<'a> {
    pub fn new(registry: &'a dyn ModelRegistry, store: &'a dyn DataStore) -> Self {
        Self {
            registry,
            store,
            loaded: RefCell::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &'a dyn ModelRegistry {
        self.registry
    }

    pub fn table(&self, model: &ModelDef) -> Result<Rc<Table>, QueryError> {
        let label = model.label();
        if let Some(table) = self.loaded.borrow().get(&label) {
            return Ok(Rc::clone(table));
        }
        let table = Rc::new(Table::new(self.store.load(model)?));
        self.loaded.borrow_mut().insert(label, Rc::clone(&table));
        Ok(table)
    }

    /// Record of `label` with the given id
    pub fn get(&self, label: &str, id: u64) -> Result<Option<Record>, QueryError> {
        let model = self.registry.resolve(label)?;
        Ok(self.table(model)?.get(id).cloned())
    }

    /// Records holding a foreign key to `id` through `relation`
    pub fn referencing(
        &self,
        relation: &ReverseRelation,
        id: u64,
    ) -> Result<Vec<Record>, QueryError> {
        let model = self.registry.resolve(&relation.model)?;
        let table = self.table(model)?;
        Ok(table
            .records
            .iter()
            .filter(|r| r.foreign_id(&relation.field) == Some(id))
            .cloned()
            .collect())
    }
}
