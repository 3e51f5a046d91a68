//! Data stores - where model records live
//!
//! The ORM layer only needs to load a model's table and write it back;
//! everything else (filtering, ordering, relations) happens above this trait.

pub mod memory;
pub mod yaml;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::Record;
use crate::schema::ModelDef;
use crate::yaml::YamlError;

pub use memory::MemoryStore;
pub use yaml::YamlStore;

/// Errors raised by a data store
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("failed to {operation} {}", path.display())]
    #[diagnostic(code(cliquery::store::io))]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {model} records: {message}")]
    #[diagnostic(code(cliquery::store::serialize))]
    Serialize { model: String, message: String },

    #[error("{model} has more than one record with id {id}")]
    #[diagnostic(
        code(cliquery::store::duplicate_id),
        help("every record of a model needs a unique id")
    )]
    DuplicateId { model: String, id: u64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),
}

/// Table-level access to the records of a model
pub trait DataStore {
    /// All records of a model, in storage order
    fn load(&self, model: &ModelDef) -> Result<Vec<Record>, StoreError>;

    /// Replace the stored records of a model
    fn save(&mut self, model: &ModelDef, records: &[Record]) -> Result<(), StoreError>;
}

/// Reject tables that carry the same id twice
pub(crate) fn check_unique_ids(model: &ModelDef, records: &[Record]) -> Result<(), StoreError> {
    let mut seen = std::collections::HashSet::new();
    for record in records {
        if !seen.insert(record.id) {
            return Err(StoreError::DuplicateId {
                model: model.label(),
                id: record.id,
            });
        }
    }
    Ok(())
}
