//! Project discovery and layout
//!
//! A project is a directory holding `settings.yaml`. Each application is a
//! subdirectory with a `models.yaml`, its records under `data/`, and
//! optionally its own `templates/`.

use miette::Diagnostic;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::core::config::ConfigLayer;
use crate::schema::{Schema, SchemaError};
use crate::store::YamlStore;
use crate::yaml::{parse_yaml_file_or_default, YamlError};

pub const SETTINGS_FILE: &str = "settings.yaml";
pub const MODELS_FILE: &str = "models.yaml";
pub const APP_TEMPLATES_DIR: &str = "templates";

#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("not a cliquery project (or any parent up to {})", start.display())]
    #[diagnostic(
        code(cliquery::project::not_found),
        help("run inside a directory containing settings.yaml, or pass --project")
    )]
    NotFound { start: PathBuf },

    #[error("application '{app}' is installed but {} is missing", path.display())]
    #[diagnostic(code(cliquery::project::missing_models))]
    MissingModels { app: String, path: PathBuf },

    #[error("failed to determine the working directory")]
    #[diagnostic(code(cliquery::project::cwd))]
    CurrentDir(#[source] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Settings(#[from] YamlError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),
}

/// Contents of settings.yaml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Applications to load; every directory with a models.yaml when absent
    #[serde(default)]
    pub installed_apps: Option<Vec<String>>,

    /// Template search path, relative to the project root
    #[serde(default)]
    pub template_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub config: ConfigLayer,
}

#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    settings: Settings,
}

impl Project {
    /// Find the project containing the working directory
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir().map_err(ProjectError::CurrentDir)?;
        Self::discover_from(&cwd)
    }

    /// Walk up from `start` to the first directory with settings.yaml
    #[instrument]
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        for dir in start.ancestors() {
            if dir.join(SETTINGS_FILE).is_file() {
                debug!(root = %dir.display(), "found project");
                return Self::open(dir);
            }
        }
        Err(ProjectError::NotFound {
            start: start.to_path_buf(),
        })
    }

    /// Open the project rooted at `root`
    pub fn open(root: &Path) -> Result<Self, ProjectError> {
        let settings_path = root.join(SETTINGS_FILE);
        if !settings_path.is_file() {
            return Err(ProjectError::NotFound {
                start: root.to_path_buf(),
            });
        }
        let settings: Settings = parse_yaml_file_or_default(&settings_path)?;
        Ok(Self {
            root: root.to_path_buf(),
            settings,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Installed applications, or every subdirectory holding models.yaml
    pub fn app_names(&self) -> Vec<String> {
        if let Some(apps) = &self.settings.installed_apps {
            return apps.clone();
        }
        let mut apps: Vec<String> = WalkDir::new(&self.root)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name() == MODELS_FILE)
            .filter_map(|e| {
                e.path()
                    .parent()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
            })
            .collect();
        apps.sort();
        apps
    }

    pub fn app_dir(&self, app: &str) -> PathBuf {
        self.root.join(app)
    }

    /// Load every application's models into a registry
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn load_schema(&self) -> Result<Schema, ProjectError> {
        let mut apps = Vec::new();
        for name in self.app_names() {
            let dir = self.app_dir(&name);
            if !dir.join(MODELS_FILE).is_file() {
                return Err(ProjectError::MissingModels {
                    app: name,
                    path: dir.join(MODELS_FILE),
                });
            }
            apps.push(Schema::load_application(&name, &dir)?);
        }
        debug!(apps = apps.len(), "loaded schema");
        Ok(Schema::new(apps)?)
    }

    /// Template search path: settings.template_dirs, then each app's templates/
    pub fn template_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .settings
            .template_dirs
            .iter()
            .map(|d| self.root.join(d))
            .collect();
        dirs.extend(
            self.app_names()
                .iter()
                .map(|app| self.app_dir(app).join(APP_TEMPLATES_DIR))
                .filter(|d| d.is_dir()),
        );
        dirs
    }

    pub fn store(&self) -> YamlStore {
        YamlStore::new(&self.root)
    }
}
