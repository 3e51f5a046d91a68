//! Filter and ordering paths across relations (`server__rack__name`)

use crate::core::Record;
use crate::orm::tables::Tables;
use crate::orm::value::Scalar;
use crate::orm::{Lookup, QueryError};
use crate::schema::{FieldDef, FieldKind, ModelDef, ModelRegistry, ReverseRelation, PK_NAMES};

/// Separator between path segments
pub const SEP: &str = "__";

/// One step from a model to a related model
#[derive(Debug, Clone, PartialEq)]
pub enum Hop {
    /// Follow a foreign key to the record it points at
    Forward { field: String, target: String },
    /// Follow a reverse relation to every record pointing here
    Reverse(ReverseRelation),
}

/// What a path ends on
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    Pk,
    Field(FieldDef),
}

impl Terminal {
    pub fn kind(&self) -> FieldKind {
        match self {
            Terminal::Pk => FieldKind::Integer,
            Terminal::Field(f) => f.kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Terminal::Pk => "id",
            Terminal::Field(f) => &f.name,
        }
    }
}

/// A resolved path: relation hops, the terminal field, and the lookup
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    pub hops: Vec<Hop>,
    pub terminal: Terminal,
    pub lookup: Lookup,
}

impl FieldPath {
    /// Resolve a filter key such as `interface__mac_address__iexact`
    pub fn for_filter(
        registry: &dyn ModelRegistry,
        model: &ModelDef,
        path: &str,
    ) -> Result<FieldPath, QueryError> {
        let mut segments: Vec<&str> = path.split(SEP).collect();
        let mut lookup = Lookup::Exact;
        if segments.len() > 1 {
            if let Some(l) = segments.last().and_then(|s| Lookup::from_name(s)) {
                lookup = l;
                segments.pop();
            }
        }
        let (hops, terminal) = walk(registry, model, &segments)?;
        Ok(FieldPath {
            hops,
            terminal,
            lookup,
        })
    }

    /// Resolve an ordering key such as `server__name` (no lookup allowed)
    pub fn for_ordering(
        registry: &dyn ModelRegistry,
        model: &ModelDef,
        path: &str,
    ) -> Result<FieldPath, QueryError> {
        let segments: Vec<&str> = path.split(SEP).collect();
        let (hops, terminal) = walk(registry, model, &segments)?;
        Ok(FieldPath {
            hops,
            terminal,
            lookup: Lookup::Exact,
        })
    }

    /// Every terminal value reachable from `record`
    ///
    /// Reverse hops fan out; a record that reaches nothing yields a single null.
    pub fn values(&self, tables: &Tables, record: &Record) -> Result<Vec<Scalar>, QueryError> {
        let mut current = vec![record.clone()];

        for hop in &self.hops {
            let mut next = Vec::new();
            for rec in &current {
                match hop {
                    Hop::Forward { field, target } => {
                        if let Some(id) = rec.foreign_id(field) {
                            next.extend(tables.get(target, id)?);
                        }
                    }
                    Hop::Reverse(relation) => {
                        next.extend(tables.referencing(relation, rec.id)?);
                    }
                }
            }
            if next.is_empty() {
                return Ok(vec![Scalar::Null]);
            }
            current = next;
        }

        Ok(current
            .iter()
            .map(|rec| match &self.terminal {
                Terminal::Pk => Scalar::Int(rec.id as i64),
                Terminal::Field(f) => Scalar::from_stored(f.kind, rec.get(&f.name)),
            })
            .collect())
    }
}

fn walk(
    registry: &dyn ModelRegistry,
    model: &ModelDef,
    segments: &[&str],
) -> Result<(Vec<Hop>, Terminal), QueryError> {
    let mut hops = Vec::new();
    let mut current = model;

    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();

        if PK_NAMES.contains(segment) {
            if !last {
                return Err(unsupported(segments[i + 1], "id", FieldKind::Integer));
            }
            return Ok((hops, Terminal::Pk));
        }

        if let Some(field) = current.field(segment) {
            if last {
                return Ok((hops, Terminal::Field(field.clone())));
            }
            match &field.to {
                Some(target) => {
                    hops.push(Hop::Forward {
                        field: field.name.clone(),
                        target: target.clone(),
                    });
                    current = registry.resolve(target)?;
                }
                None => return Err(unsupported(segments[i + 1], &field.name, field.kind)),
            }
            continue;
        }

        if let Some(relation) = registry
            .reverse_relations(current)
            .iter()
            .find(|r| r.name == *segment)
        {
            hops.push(Hop::Reverse(relation.clone()));
            current = registry.resolve(&relation.model)?;
            if last {
                return Ok((hops, Terminal::Pk));
            }
            continue;
        }

        return Err(QueryError::UnknownField {
            model: current.label(),
            name: segment.to_string(),
            available: filter_names(registry, current).join(", "),
        });
    }

    Err(QueryError::UnknownField {
        model: current.label(),
        name: String::new(),
        available: filter_names(registry, current).join(", "),
    })
}

fn unsupported(lookup: &str, field: &str, kind: FieldKind) -> QueryError {
    QueryError::UnsupportedLookup {
        field: field.to_string(),
        kind,
        lookup: lookup.to_string(),
        available: Lookup::names(),
    }
}

/// Names a filter path may use on `model`
pub fn filter_names(registry: &dyn ModelRegistry, model: &ModelDef) -> Vec<String> {
    let mut names: Vec<String> = PK_NAMES.iter().map(|s| s.to_string()).collect();
    names.extend(model.fields.iter().map(|f| f.name.clone()));
    names.extend(registry.reverse_relations(model).iter().map(|r| r.name.clone()));
    names
}
