//! Core module - project layout, configuration, and records

pub mod config;
pub mod project;
pub mod record;

pub use config::{Config, ConfigLayer};
pub use project::{Project, ProjectError, Settings};
pub use record::Record;
