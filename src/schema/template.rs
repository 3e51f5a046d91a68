//! Template loading and rendering for query results

use miette::Diagnostic;
use rust_embed::Embed;
use std::io::Read;
use std::path::{Path, PathBuf};
use tera::Tera;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Embed)]
#[folder = "templates/"]
struct BuiltinTemplates;

/// Prefix for templates shipped inside the binary
pub const BUILTIN_PREFIX: &str = "builtin/";

#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    #[error("template not found: {name}")]
    #[diagnostic(
        code(cliquery::template::not_found),
        help("looked for a file of that name, then in: {searched}")
    )]
    NotFound { name: String, searched: String },

    #[error("failed to read template {name}")]
    #[diagnostic(code(cliquery::template::io))]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template syntax error in {name}: {message}")]
    #[diagnostic(code(cliquery::template::syntax))]
    Syntax { name: String, message: String },

    #[error("failed to render {name}: {message}")]
    #[diagnostic(code(cliquery::template::render))]
    Render { name: String, message: String },
}

/// A template's name (for messages) and its source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub source: String,
}

impl Template {
    pub fn inline(source: impl Into<String>) -> Self {
        Self {
            name: "<inline>".to_string(),
            source: source.into(),
        }
    }
}

/// Renders a template with the query result bound to `objects`
pub trait TemplateRenderer {
    /// Parse `template` without rendering it
    fn check(&self, template: &Template) -> Result<(), TemplateError>;

    fn render(
        &self,
        template: &Template,
        objects: &serde_json::Value,
    ) -> Result<String, TemplateError>;
}

/// Finds templates given on the command line
///
/// `-` reads stdin, an existing path is read directly, anything else is
/// looked up by name in the template directories and then among the
/// built-in templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateLoader {
    dirs: Vec<PathBuf>,
}

impl TemplateLoader {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn load(&self, spec: &str, stdin: &mut dyn Read) -> Result<Template, TemplateError> {
        if spec == "-" {
            let mut source = String::new();
            stdin
                .read_to_string(&mut source)
                .map_err(|source| TemplateError::Io {
                    name: "<stdin>".to_string(),
                    source,
                })?;
            return Ok(Template {
                name: "<stdin>".to_string(),
                source,
            });
        }

        let path = Path::new(spec);
        if path.is_file() {
            debug!(path = %path.display(), "template from file");
            return read_template(spec, path);
        }

        for dir in &self.dirs {
            let candidate = dir.join(spec);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "template from loader path");
                return read_template(spec, &candidate);
            }
        }

        if let Some(template) = builtin(spec) {
            debug!(name = spec, "built-in template");
            return Ok(template);
        }

        Err(TemplateError::NotFound {
            name: spec.to_string(),
            searched: self.searched(),
        })
    }

    /// Every template under the loader directories, for `{% include %}`
    pub fn partials(&self) -> Vec<Template> {
        let mut partials = Vec::new();
        for dir in self.dirs.iter().filter(|d| d.is_dir()) {
            for entry in WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let Ok(relative) = entry.path().strip_prefix(dir) else {
                    continue;
                };
                let name = relative.to_string_lossy().replace('\\', "/");
                if partials.iter().any(|t: &Template| t.name == name) {
                    continue;
                }
                if let Ok(source) = std::fs::read_to_string(entry.path()) {
                    partials.push(Template { name, source });
                }
            }
        }
        partials
    }

    fn searched(&self) -> String {
        let mut places: Vec<String> = self.dirs.iter().map(|d| d.display().to_string()).collect();
        places.push(format!("{}{{{}}}", BUILTIN_PREFIX, builtin_names().join(",")));
        places.join(", ")
    }
}

fn read_template(name: &str, path: &Path) -> Result<Template, TemplateError> {
    let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
        name: name.to_string(),
        source,
    })?;
    Ok(Template {
        name: name.to_string(),
        source,
    })
}

/// Built-in template by its `builtin/` name
pub fn builtin(name: &str) -> Option<Template> {
    let short = name.strip_prefix(BUILTIN_PREFIX)?;
    let file = BuiltinTemplates::get(&format!("{}.tera", short))?;
    let source = std::str::from_utf8(&file.data).ok()?.to_string();
    Some(Template {
        name: name.to_string(),
        source,
    })
}

pub fn builtin_names() -> Vec<String> {
    let mut names: Vec<String> = BuiltinTemplates::iter()
        .filter_map(|f| f.strip_suffix(".tera").map(|s| s.to_string()))
        .collect();
    names.sort();
    names
}

/// Tera-backed renderer
///
/// Output is plain text, so autoescaping is off.
#[derive(Debug, Clone, Default)]
pub struct TeraRenderer {
    partials: Vec<Template>,
    model: Option<String>,
}

impl TeraRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Templates available to `{% include %}` and `{% extends %}`
    pub fn with_partials(mut self, partials: Vec<Template>) -> Self {
        self.partials = partials;
        self
    }

    /// Label of the queried model, bound as `model`
    pub fn with_model(mut self, label: impl Into<String>) -> Self {
        self.model = Some(label.into());
        self
    }

    /// A Tera instance holding the partials and `template`
    ///
    /// A partial that fails to parse or to find its parent is left out.
    fn build(&self, template: &Template) -> Result<Tera, TemplateError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        let mut pending: Vec<&Template> = self
            .partials
            .iter()
            .filter(|p| p.name != template.name)
            .collect();
        // Parents may come after their children, so retry until nothing changes
        loop {
            let before = pending.len();
            pending.retain(|partial| {
                let mut scratch = tera.clone();
                match scratch.add_raw_template(&partial.name, &partial.source) {
                    Ok(()) => {
                        tera = scratch;
                        false
                    }
                    Err(_) => true,
                }
            });
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }
        for partial in pending {
            debug!(name = %partial.name, "skipping unusable partial");
        }

        tera.add_raw_template(&template.name, &template.source)
            .map_err(|e| TemplateError::Syntax {
                name: template.name.clone(),
                message: error_chain(&e),
            })?;
        Ok(tera)
    }
}

impl TemplateRenderer for TeraRenderer {
    fn check(&self, template: &Template) -> Result<(), TemplateError> {
        self.build(template).map(|_| ())
    }

    fn render(
        &self,
        template: &Template,
        objects: &serde_json::Value,
    ) -> Result<String, TemplateError> {
        let tera = self.build(template)?;

        let mut context = tera::Context::new();
        context.insert("objects", objects);
        if let Some(model) = &self.model {
            context.insert("model", model);
        }

        tera.render(&template.name, &context)
            .map_err(|e| TemplateError::Render {
                name: template.name.clone(),
                message: error_chain(&e),
            })
    }
}

/// Tera keeps the useful detail in the source chain
fn error_chain(err: &tera::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}
