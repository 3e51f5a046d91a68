//! cliquery: query a YAML-backed data model from the shell
//!
//! Positional `key=value` arguments become ORM-style filter predicates,
//! the matching records are printed as delimited fields or through a
//! template, and optional `-u field=value` updates are applied after
//! confirmation.

pub mod cli;
pub mod core;
pub mod orm;
pub mod schema;
pub mod store;
pub mod yaml;
