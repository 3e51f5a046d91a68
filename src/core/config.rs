//! Layered configuration: defaults, user config file, project settings

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::yaml::parse_yaml_file;

/// Environment variable pointing at an alternative user config file
pub const CONFIG_ENV: &str = "CLIQUERY_CONFIG";

/// One layer of optional settings; later layers override earlier ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    /// Separator between fields in delimited output
    #[serde(default)]
    pub separator: Option<String>,

    /// Text printed for null values
    #[serde(default)]
    pub null_text: Option<String>,

    /// How many relation levels templates see expanded
    #[serde(default)]
    pub template_depth: Option<usize>,
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub separator: String,
    pub null_text: String,
    pub template_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            null_text: String::new(),
            template_depth: 2,
        }
    }
}

impl Config {
    /// Defaults, then the user config file, then the given project layer
    pub fn load(project_layer: Option<&ConfigLayer>) -> Self {
        let mut config = Self::default();
        if let Some(layer) = Self::user_layer() {
            config.apply(&layer);
        }
        if let Some(layer) = project_layer {
            config.apply(layer);
        }
        config
    }

    pub fn apply(&mut self, layer: &ConfigLayer) {
        if let Some(separator) = &layer.separator {
            self.separator = separator.clone();
        }
        if let Some(null_text) = &layer.null_text {
            self.null_text = null_text.clone();
        }
        if let Some(depth) = layer.template_depth {
            self.template_depth = depth;
        }
    }

    /// Location of the user config file
    pub fn user_config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("", "", "cliquery").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn user_layer() -> Option<ConfigLayer> {
        let path = Self::user_config_path()?;
        if !path.is_file() {
            return None;
        }
        match parse_yaml_file::<ConfigLayer>(&path) {
            Ok(layer) => {
                debug!(path = %path.display(), "loaded user config");
                Some(layer)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable user config");
                None
            }
        }
    }
}
