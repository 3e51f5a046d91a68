//! ORM layer - querysets over a model registry and a data store
//!
//! Predicates come in as `(path, negated, value)` triples. Paths follow the
//! familiar `field__related__lookup` convention; see [`lookup::Lookup`] for
//! the comparisons available at the end of a path.

pub mod attr;
pub mod context;
pub mod error;
pub mod lookup;
pub mod path;
pub mod predicate;
pub mod queryset;
pub mod tables;
pub mod value;

use std::collections::BTreeMap;

pub use attr::{check_attr_path, display, resolve_attr, Attr};
pub use context::objects_context;
pub use error::QueryError;
pub use lookup::Lookup;
pub use predicate::{FilterValue, Predicate};
pub use queryset::QuerySet;
pub use tables::Tables;
pub use value::Scalar;

/// Field assignments for a bulk update, sorted by field name
pub type Changes = BTreeMap<String, serde_json::Value>;
