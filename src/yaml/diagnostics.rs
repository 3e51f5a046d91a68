//! Diagnostic errors for YAML files in a project

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors raised while reading project YAML files
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error("failed to read YAML file")]
    #[diagnostic(code(cliquery::yaml::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(YamlSyntaxError),
}

/// A YAML syntax or shape error with the offending location highlighted
#[derive(Debug, Error, Diagnostic)]
#[error("invalid YAML in {filename}: {message}")]
#[diagnostic(code(cliquery::yaml::syntax))]
pub struct YamlSyntaxError {
    pub filename: String,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,

    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: Option<SourceSpan>,
}

impl YamlSyntaxError {
    /// Build from a serde_yml error, keeping the source for display
    pub fn from_serde_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        let location = err.location();
        let span = location.as_ref().map(|loc| {
            let offset = loc.index().min(content.len());
            SourceSpan::from((offset, 0))
        });

        Self {
            filename: filename.to_string(),
            message: strip_location(&err.to_string()),
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
            src: NamedSource::new(filename, content.to_string()),
            span,
        }
    }
}

/// serde_yml appends "at line X column Y" to messages; the span shows that already
fn strip_location(message: &str) -> String {
    match message.find(" at line ") {
        Some(pos) => message[..pos].to_string(),
        None => message.to_string(),
    }
}
