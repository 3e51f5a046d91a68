//! QuerySet - a filtered, ordered view of a model's records

use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::core::Record;
use crate::orm::lookup::Operand;
use crate::orm::path::FieldPath;
use crate::orm::tables::Tables;
use crate::orm::{Changes, Predicate, QueryError};
use crate::schema::{ModelDef, ModelRegistry};
use crate::store::DataStore;

/// A predicate with its path resolved and value prepared
#[derive(Debug, Clone)]
struct Condition {
    path: FieldPath,
    operand: Operand,
    negated: bool,
}

impl Condition {
    fn matches(&self, tables: &Tables, record: &Record) -> Result<bool, QueryError> {
        let hit = self
            .path
            .values(tables, record)?
            .iter()
            .any(|v| self.path.lookup.matches(v, &self.operand));
        Ok(hit != self.negated)
    }
}

#[derive(Debug, Clone)]
struct OrderKey {
    path: FieldPath,
    descending: bool,
}

/// Description of a query; nothing is read until [`QuerySet::evaluate`]
#[derive(Clone)]
pub struct QuerySet<'a> {
    registry: &'a dyn ModelRegistry,
    model: &'a ModelDef,
    conditions: Vec<Condition>,
    ordering: Option<Vec<OrderKey>>,
    distinct: bool,
}

impl<'a> QuerySet<'a> {
    /// All records of `model`
    pub fn new(registry: &'a dyn ModelRegistry, model: &'a ModelDef) -> Self {
        Self {
            registry,
            model,
            conditions: Vec::new(),
            ordering: None,
            distinct: false,
        }
    }

    pub fn model(&self) -> &'a ModelDef {
        self.model
    }

    /// Keep records matching every predicate
    pub fn filter(mut self, predicates: &[Predicate]) -> Result<Self, QueryError> {
        for predicate in predicates {
            let path = FieldPath::for_filter(self.registry, self.model, &predicate.path)?;
            let operand = path.lookup.prepare(
                path.terminal.name(),
                path.terminal.kind(),
                &predicate.value,
            )?;
            debug!(%predicate, "compiled filter");
            self.conditions.push(Condition {
                path,
                operand,
                negated: predicate.negated,
            });
        }
        Ok(self)
    }

    /// Order by field paths; a leading `-` sorts descending
    pub fn order_by<S: AsRef<str>>(mut self, fields: &[S]) -> Result<Self, QueryError> {
        let mut keys = Vec::new();
        for field in fields {
            let field = field.as_ref();
            let (name, descending) = match field.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (field, false),
            };
            keys.push(OrderKey {
                path: FieldPath::for_ordering(self.registry, self.model, name)?,
                descending,
            });
        }
        self.ordering = Some(keys);
        Ok(self)
    }

    /// Drop repeated records
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Run the query against `store`
    #[instrument(skip_all, fields(model = %self.model.label()))]
    pub fn evaluate(&self, store: &dyn DataStore) -> Result<Vec<Record>, QueryError> {
        let tables = Tables::new(self.registry, store);
        let table = tables.table(self.model)?;

        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        for record in &table.records {
            if self.distinct && !seen.insert(record.id) {
                continue;
            }
            let mut keep = true;
            for condition in &self.conditions {
                if !condition.matches(&tables, record)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                rows.push(record.clone());
            }
        }

        self.sort(&tables, &mut rows)?;
        debug!(matched = rows.len(), of = table.records.len(), "evaluated queryset");
        Ok(rows)
    }

    /// Number of matching records
    pub fn count(&self, store: &dyn DataStore) -> Result<usize, QueryError> {
        Ok(self.evaluate(store)?.len())
    }

    /// Assign `changes` to every matching record, returning how many changed
    #[instrument(skip_all, fields(model = %self.model.label()))]
    pub fn update(&self, store: &mut dyn DataStore, changes: &Changes) -> Result<usize, QueryError> {
        let ids: HashSet<u64> = self.evaluate(&*store)?.iter().map(|r| r.id).collect();
        if ids.is_empty() || changes.is_empty() {
            return Ok(0);
        }

        let mut records = store.load(self.model)?;
        let mut updated = 0;
        for record in records.iter_mut().filter(|r| ids.contains(&r.id)) {
            for (field, value) in changes {
                record.set(field, value.clone());
            }
            updated += 1;
        }
        store.save(self.model, &records)?;
        debug!(updated, "applied update");
        Ok(updated)
    }

    fn sort(&self, tables: &Tables, rows: &mut Vec<Record>) -> Result<(), QueryError> {
        let keys = match &self.ordering {
            Some(keys) => keys.clone(),
            None if !self.model.ordering.is_empty() => {
                let defaults = QuerySet::new(self.registry, self.model)
                    .order_by(&self.model.ordering)?;
                defaults.ordering.unwrap_or_default()
            }
            None => Vec::new(),
        };

        if keys.is_empty() {
            rows.sort_by_key(|r| r.id);
            return Ok(());
        }

        // Compute sort values up front; the comparator can't fail
        let mut keyed = Vec::with_capacity(rows.len());
        for record in rows.drain(..) {
            let mut values = Vec::with_capacity(keys.len());
            for key in &keys {
                let first = key.path.values(tables, &record)?.into_iter().next();
                values.push(first.unwrap_or(crate::orm::Scalar::Null));
            }
            keyed.push((values, record));
        }

        keyed.sort_by(|(a, _), (b, _)| {
            for (i, key) in keys.iter().enumerate() {
                let ord = a[i].sort_cmp(&b[i]);
                let ord = if key.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        rows.extend(keyed.into_iter().map(|(_, r)| r));
        Ok(())
    }
}
