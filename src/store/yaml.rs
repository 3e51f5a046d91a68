//! YAML-file data store
//!
//! Records of `app.Model` live in `<root>/<app>/data/<Model>.yaml` as a
//! sequence of mappings, each with an `id` key.

use std::fs;
use std::path::PathBuf;
use tracing::{debug, instrument};

use crate::core::Record;
use crate::schema::ModelDef;
use crate::store::{check_unique_ids, DataStore, StoreError};
use crate::yaml::parse_yaml_file_or_default;

/// Data directory name inside each application
pub const DATA_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct YamlStore {
    root: PathBuf,
}

impl YamlStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File holding the records of a model
    pub fn table_path(&self, model: &ModelDef) -> PathBuf {
        self.root
            .join(&model.app)
            .join(DATA_DIR)
            .join(format!("{}.yaml", model.name))
    }
}

impl DataStore for YamlStore {
    #[instrument(skip_all, fields(model = %model.label()))]
    fn load(&self, model: &ModelDef) -> Result<Vec<Record>, StoreError> {
        let path = self.table_path(model);
        if !path.exists() {
            debug!(path = %path.display(), "no data file, empty table");
        }
        let records: Vec<Record> = parse_yaml_file_or_default(&path)?;
        check_unique_ids(model, &records)?;
        debug!(records = records.len(), "loaded table");
        Ok(records)
    }

    #[instrument(skip_all, fields(model = %model.label()))]
    fn save(&mut self, model: &ModelDef, records: &[Record]) -> Result<(), StoreError> {
        let path = self.table_path(model);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                operation: "create",
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_yml::to_string(records).map_err(|e| StoreError::Serialize {
            model: model.label(),
            message: e.to_string(),
        })?;
        fs::write(&path, content).map_err(|source| StoreError::Io {
            operation: "write",
            path: path.clone(),
            source,
        })?;
        debug!(records = records.len(), path = %path.display(), "saved table");
        Ok(())
    }
}
