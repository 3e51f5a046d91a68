//! YAML reading with source-annotated diagnostics

pub mod diagnostics;
pub mod parser;

pub use diagnostics::{YamlError, YamlSyntaxError};
pub use parser::{parse_yaml, parse_yaml_file, parse_yaml_file_or_default};
