//! Typed YAML reads for project files

use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::trace;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML content, reporting syntax errors against `filename`
pub fn parse_yaml<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content).map_err(|e| {
        YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename))
    })
}

/// Read and parse a YAML file
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    trace!(path = %path.display(), bytes = content.len(), "read yaml");
    parse_yaml(&content, &path.display().to_string())
}

/// Like [`parse_yaml_file`], but a missing or blank file gives `T::default()`
///
/// Data files start out absent and settings files may be left empty.
pub fn parse_yaml_file_or_default<T: DeserializeOwned + Default>(
    path: &Path,
) -> Result<T, YamlError> {
    if !path.is_file() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    parse_yaml(&content, &path.display().to_string())
}
