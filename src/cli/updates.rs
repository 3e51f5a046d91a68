//! Bulk updates given with `-u field=value`
//!
//! Updates are validated against the model before anything is written, then
//! previewed record by record so the user can confirm them.

use std::collections::BTreeMap;
use std::io::Write;

use miette::{IntoDiagnostic, Result};
use serde_json::Value;
use tracing::debug;

use crate::core::Record;
use crate::orm::{display, resolve_attr, Changes, QueryError, Scalar, Tables};
use crate::schema::{FieldDef, ModelDef, PK_NAMES};

/// Values that clear a nullable field
const NULL_WORDS: [&str; 3] = ["", "None", "null"];

/// Raw `field=value` assignments, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSet {
    values: BTreeMap<String, String>,
}

impl UpdateSet {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Assignments in field name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check every assignment against `model` and convert it to a stored value
    pub fn validate(&self, tables: &Tables, model: &ModelDef) -> Result<Changes, QueryError> {
        let registry = tables.registry();
        let mut changes = Changes::new();

        for (key, raw) in self.iter() {
            let is_reverse = registry
                .reverse_relations(model)
                .iter()
                .any(|r| r.name == key || r.attr_name() == key);
            if PK_NAMES.contains(&key) || is_reverse {
                return Err(QueryError::ReadOnlyField {
                    model: model.name.clone(),
                    field: key.to_string(),
                    available: model.field_names().join(", "),
                });
            }

            let field = model.field(key).ok_or_else(|| QueryError::UnknownField {
                model: model.name.clone(),
                name: key.to_string(),
                available: model.field_names().join(", "),
            })?;

            changes.insert(key.to_string(), stored_value(tables, field, raw)?);
        }

        debug!(model = %model.label(), fields = changes.len(), "validated updates");
        Ok(changes)
    }
}

fn stored_value(tables: &Tables, field: &FieldDef, raw: &str) -> Result<Value, QueryError> {
    if field.null && NULL_WORDS.contains(&raw) {
        return Ok(Value::Null);
    }

    let choices = field.choice_values();
    if !choices.is_empty() && !choices.contains(&raw) {
        return Err(QueryError::InvalidChoice {
            field: field.name.clone(),
            value: raw.to_string(),
            choices: choices.join(", "),
        });
    }

    let value = Scalar::coerce(field, raw)?;

    if let (Some(target), Scalar::Int(id)) = (&field.to, &value) {
        let missing = || QueryError::MissingRelated {
            model: target.clone(),
            id: (*id).max(0) as u64,
        };
        let id = u64::try_from(*id).map_err(|_| missing())?;
        if tables.get(target, id)?.is_none() {
            return Err(missing());
        }
    }

    Ok(value.to_value())
}

/// Parse one `field=value` token
pub fn parse_update(token: &str) -> Result<(String, String), QueryError> {
    let (key, value) = token
        .split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .ok_or_else(|| QueryError::MalformedUpdate {
            token: token.to_string(),
        })?;
    Ok((key.trim().to_string(), value.to_string()))
}

/// Parse every update token; a later assignment to the same field wins
pub fn parse_updates<S: AsRef<str>>(tokens: &[S]) -> Result<UpdateSet, QueryError> {
    let mut set = UpdateSet::default();
    for token in tokens {
        let (key, value) = parse_update(token.as_ref())?;
        set.values.insert(key, value);
    }
    Ok(set)
}

/// Show each matched record with its current and new values
///
/// ```text
/// mc01
///   rack     r1   => r2
///   status   live => spare
/// ```
pub fn preview(
    out: &mut dyn Write,
    tables: &Tables,
    model: &ModelDef,
    records: &[Record],
    updates: &UpdateSet,
    null_text: &str,
) -> Result<()> {
    let keylen = updates.values.keys().map(|k| k.chars().count()).max().unwrap_or(0) + 3;

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let mut old = Vec::with_capacity(updates.len());
        for (key, _) in updates.iter() {
            old.push(resolve_attr(tables, model, record, key)?.text(tables, null_text)?);
        }
        rows.push((record, old));
    }
    let vallen = rows
        .iter()
        .flat_map(|(_, old)| old.iter().map(|v| v.chars().count()))
        .max()
        .unwrap_or(0)
        + 3;

    let mut new = Vec::with_capacity(updates.len());
    for (key, raw) in updates.iter() {
        new.push(new_text(tables, model, key, raw, null_text)?);
    }

    for (record, old) in &rows {
        writeln!(out, "{}", display(model, record, null_text)).into_diagnostic()?;
        for ((key, new), old) in updates.values.keys().zip(&new).zip(old) {
            writeln!(out, "  {key:<keylen$}{old:<vallen$}=> {new}").into_diagnostic()?;
        }
    }
    Ok(())
}

/// A new value as the preview shows it; foreign keys read like the old value
fn new_text(
    tables: &Tables,
    model: &ModelDef,
    key: &str,
    raw: &str,
    null_text: &str,
) -> Result<String, QueryError> {
    let target = model.field(key).and_then(|f| f.to.as_deref());
    let (Some(target), Ok(id)) = (target, raw.trim().parse::<u64>()) else {
        return Ok(raw.to_string());
    };
    let related = tables.registry().resolve(target)?;
    Ok(match tables.get(target, id)? {
        Some(record) => display(related, &record, null_text),
        None => raw.to_string(),
    })
}
