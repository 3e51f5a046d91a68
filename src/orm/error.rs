//! Errors raised while building or running a query

use miette::Diagnostic;
use thiserror::Error;

use crate::schema::{FieldKind, SchemaError};
use crate::store::StoreError;

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("malformed filter '{token}'")]
    #[diagnostic(
        code(cliquery::query::malformed_filter),
        help("filters are written key=value, e.g. name__startswith=mc01")
    )]
    MalformedFilter { token: String },

    #[error("malformed update '{token}'")]
    #[diagnostic(
        code(cliquery::query::malformed_update),
        help("updates are written field=value, e.g. -u status=retired")
    )]
    MalformedUpdate { token: String },

    #[error("{model} has no field '{name}'")]
    #[diagnostic(
        code(cliquery::query::unknown_field),
        help("choices are: {available}")
    )]
    UnknownField {
        model: String,
        name: String,
        available: String,
    },

    #[error("unsupported lookup '{lookup}' for {kind} field '{field}'")]
    #[diagnostic(
        code(cliquery::query::unsupported_lookup),
        help("lookups are: {available}")
    )]
    UnsupportedLookup {
        field: String,
        kind: FieldKind,
        lookup: String,
        available: String,
    },

    #[error("'{model}' has no attribute '{name}'")]
    #[diagnostic(
        code(cliquery::query::no_attribute),
        help("available attributes: {available}")
    )]
    NoAttribute {
        model: String,
        name: String,
        available: String,
    },

    #[error("cannot read '{name}' from {kind} field '{field}'")]
    #[diagnostic(code(cliquery::query::not_traversable))]
    NotTraversable {
        field: String,
        kind: String,
        name: String,
    },

    #[error("invalid value '{value}' for {kind} field '{field}'")]
    #[diagnostic(code(cliquery::query::invalid_value))]
    InvalidValue {
        field: String,
        kind: FieldKind,
        value: String,
    },

    #[error("Invalid choice for {field}: {value}. Valid choices: {choices}")]
    #[diagnostic(code(cliquery::query::invalid_choice))]
    InvalidChoice {
        field: String,
        value: String,
        choices: String,
    },

    #[error("field '{field}' of {model} cannot be updated")]
    #[diagnostic(
        code(cliquery::query::read_only),
        help("only the model's own fields can be updated: {available}")
    )]
    ReadOnlyField {
        model: String,
        field: String,
        available: String,
    },

    #[error("{model} has no record with id {id}")]
    #[diagnostic(code(cliquery::query::missing_related))]
    MissingRelated { model: String, id: u64 },

    #[error("invalid regular expression '{pattern}'")]
    #[diagnostic(code(cliquery::query::regex))]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}
