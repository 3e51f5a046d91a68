//! Dotted attribute paths on records (`server.rack.name`)

use serde_json::Value;

use crate::core::Record;
use crate::orm::tables::Tables;
use crate::orm::value::Scalar;
use crate::orm::QueryError;
use crate::schema::{FieldKind, ModelDef, ModelRegistry, PK_NAMES};

/// What an attribute path resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Value { kind: FieldKind, value: Value },
    /// A related record reached through a foreign key
    Record { model: String, record: Record },
    /// Records pointing here through a reverse relation
    Set { model: String, records: Vec<Record> },
}

impl Attr {
    /// Text for delimited output
    pub fn text(&self, tables: &Tables, null_text: &str) -> Result<String, QueryError> {
        match self {
            Attr::Value { value: Value::Null, .. } => Ok(null_text.to_string()),
            Attr::Value { kind, value } => Ok(Scalar::from_stored(*kind, value).text()),
            Attr::Record { model, record } => {
                let model = tables.registry().resolve(model)?;
                Ok(display(model, record, null_text))
            }
            Attr::Set { model, records } => {
                let model = tables.registry().resolve(model)?;
                Ok(records
                    .iter()
                    .map(|r| display(model, r, null_text))
                    .collect::<Vec<_>>()
                    .join(", "))
            }
        }
    }
}

/// Resolve `path` on `record`, following foreign keys hop by hop
///
/// A null foreign key part-way through resolves to null rather than failing.
pub fn resolve_attr(
    tables: &Tables,
    model: &ModelDef,
    record: &Record,
    path: &str,
) -> Result<Attr, QueryError> {
    let registry = tables.registry();
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    let mut current_model = model;
    let mut current = record.clone();

    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();

        let attr = if PK_NAMES.contains(segment) {
            Attr::Value {
                kind: FieldKind::Integer,
                value: Value::from(current.id),
            }
        } else if let Some(field) = current_model.field(segment) {
            match (&field.to, current.foreign_id(&field.name)) {
                (Some(target), Some(id)) => {
                    let record = tables
                        .get(target, id)?
                        .ok_or_else(|| QueryError::MissingRelated {
                            model: target.clone(),
                            id,
                        })?;
                    Attr::Record {
                        model: target.clone(),
                        record,
                    }
                }
                (Some(_), None) => {
                    return Ok(Attr::Value {
                        kind: FieldKind::ForeignKey,
                        value: Value::Null,
                    })
                }
                (None, _) => Attr::Value {
                    kind: field.kind,
                    value: current.get(&field.name).clone(),
                },
            }
        } else if let Some(relation) = registry
            .reverse_relations(current_model)
            .iter()
            .find(|r| r.attr_name() == *segment)
        {
            Attr::Set {
                model: relation.model.clone(),
                records: tables.referencing(relation, current.id)?,
            }
        } else {
            return Err(QueryError::NoAttribute {
                model: current_model.name.clone(),
                name: segment.to_string(),
                available: attribute_names(registry, current_model).join(", "),
            });
        };

        if last {
            return Ok(attr);
        }

        match attr {
            Attr::Record { model, record } => {
                current_model = registry.resolve(&model)?;
                current = record;
            }
            Attr::Value { kind, .. } => {
                return Err(QueryError::NotTraversable {
                    field: segment.to_string(),
                    kind: kind.to_string(),
                    name: segments[i + 1].to_string(),
                })
            }
            Attr::Set { .. } => {
                return Err(QueryError::NotTraversable {
                    field: segment.to_string(),
                    kind: "related set".to_string(),
                    name: segments[i + 1].to_string(),
                })
            }
        }
    }

    Err(QueryError::NoAttribute {
        model: current_model.name.clone(),
        name: path.to_string(),
        available: attribute_names(registry, current_model).join(", "),
    })
}

/// Check an attribute path against the schema alone, without any records
pub fn check_attr_path(
    registry: &dyn ModelRegistry,
    model: &ModelDef,
    path: &str,
) -> Result<(), QueryError> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    let mut current = model;

    for (i, segment) in segments.iter().enumerate() {
        let next = segments.get(i + 1);

        if PK_NAMES.contains(segment) {
            return match next {
                None => Ok(()),
                Some(name) => Err(QueryError::NotTraversable {
                    field: segment.to_string(),
                    kind: FieldKind::Integer.to_string(),
                    name: name.to_string(),
                }),
            };
        }

        if let Some(field) = current.field(segment) {
            match (next, &field.to) {
                (None, _) => return Ok(()),
                (Some(_), Some(target)) => {
                    current = registry.resolve(target)?;
                    continue;
                }
                (Some(name), None) => {
                    return Err(QueryError::NotTraversable {
                        field: segment.to_string(),
                        kind: field.kind.to_string(),
                        name: name.to_string(),
                    })
                }
            }
        }

        let is_set = registry
            .reverse_relations(current)
            .iter()
            .any(|r| r.attr_name() == *segment);
        return match (is_set, next) {
            (true, None) => Ok(()),
            (true, Some(name)) => Err(QueryError::NotTraversable {
                field: segment.to_string(),
                kind: "related set".to_string(),
                name: name.to_string(),
            }),
            (false, _) => Err(QueryError::NoAttribute {
                model: current.name.clone(),
                name: segment.to_string(),
                available: attribute_names(registry, current).join(", "),
            }),
        };
    }

    Ok(())
}

/// Attribute names available on records of `model`
pub fn attribute_names(registry: &dyn ModelRegistry, model: &ModelDef) -> Vec<String> {
    let mut names: Vec<String> = PK_NAMES.iter().map(|s| s.to_string()).collect();
    names.extend(model.fields.iter().map(|f| f.name.clone()));
    names.extend(registry.reverse_relations(model).iter().map(|r| r.attr_name()));
    names
}

/// Text form of a record, from the model's `display` format
///
/// `{field}` placeholders are replaced with field values; without a format
/// the record shows as `<Model> object (<id>)`.
pub fn display(model: &ModelDef, record: &Record, null_text: &str) -> String {
    let Some(format) = &model.display else {
        return format!("{} object ({})", model.name, record.id);
    };

    let mut out = String::with_capacity(format.len());
    let mut rest = format.as_str();
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = after[..end].trim();
                out.push_str(&placeholder(model, record, name, null_text));
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn placeholder(model: &ModelDef, record: &Record, name: &str, null_text: &str) -> String {
    if PK_NAMES.contains(&name) {
        return record.id.to_string();
    }
    match model.field(name) {
        Some(field) => match record.get(name) {
            Value::Null => null_text.to_string(),
            value => Scalar::from_stored(field.kind, value).text(),
        },
        None => format!("{{{}}}", name),
    }
}
