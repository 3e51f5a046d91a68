//! Template binding for query results

use serde_json::{Map, Value};

use crate::core::Record;
use crate::orm::attr::display;
use crate::orm::tables::Tables;
use crate::orm::QueryError;
use crate::schema::ModelDef;

/// Build the `objects` list handed to templates
///
/// Each object carries its fields plus `id`, `pk` and `display`. Foreign keys
/// are expanded into nested objects and reverse relations into
/// `<name>_set` lists while `depth` allows; past that, foreign keys stay ids.
pub fn objects_context(
    tables: &Tables,
    model: &ModelDef,
    records: &[Record],
    depth: usize,
    null_text: &str,
) -> Result<Value, QueryError> {
    let objects = records
        .iter()
        .map(|r| object(tables, model, r, depth, null_text))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(objects))
}

fn object(
    tables: &Tables,
    model: &ModelDef,
    record: &Record,
    depth: usize,
    null_text: &str,
) -> Result<Value, QueryError> {
    let registry = tables.registry();
    let mut map = Map::new();
    map.insert("id".to_string(), Value::from(record.id));
    map.insert("pk".to_string(), Value::from(record.id));
    map.insert(
        "display".to_string(),
        Value::String(display(model, record, null_text)),
    );

    for field in &model.fields {
        let value = record.get(&field.name).clone();
        let value = match (&field.to, record.foreign_id(&field.name)) {
            (Some(target), Some(id)) if depth > 0 => {
                let target_model = registry.resolve(target)?;
                match tables.get(target, id)? {
                    Some(related) => object(tables, target_model, &related, depth - 1, null_text)?,
                    None => value,
                }
            }
            _ => value,
        };
        map.insert(field.name.clone(), value);
    }

    if depth > 0 {
        for relation in registry.reverse_relations(model) {
            let source = registry.resolve(&relation.model)?;
            let related = tables
                .referencing(relation, record.id)?
                .iter()
                .map(|r| object(tables, source, r, depth - 1, null_text))
                .collect::<Result<Vec<_>, _>>()?;
            map.insert(relation.attr_name(), Value::Array(related));
        }
    }

    Ok(Value::Object(map))
}
