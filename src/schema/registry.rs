//! Model registry - applications and models by name

use miette::Diagnostic;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::schema::model::{
    Application, FieldDef, FieldKind, FieldSpec, ModelDef, ModelSpec, ModelsFile,
    ReverseRelation, PK_NAMES,
};
use crate::yaml::{parse_yaml, YamlError};

/// Errors raised while loading or querying the model registry
#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("unknown application '{name}'")]
    #[diagnostic(
        code(cliquery::schema::unknown_application),
        help("available applications: {available}")
    )]
    UnknownApplication { name: String, available: String },

    #[error("application '{app}' has no model '{name}'")]
    #[diagnostic(
        code(cliquery::schema::unknown_model),
        help("available models: {available}")
    )]
    UnknownModel {
        app: String,
        name: String,
        available: String,
    },

    #[error("{model}.{field} points to unknown model '{target}'")]
    #[diagnostic(code(cliquery::schema::unknown_target))]
    UnknownTarget {
        model: String,
        field: String,
        target: String,
    },

    #[error("{model}.{field} is a foreign key without a 'to' model")]
    #[diagnostic(code(cliquery::schema::missing_target))]
    MissingTarget { model: String, field: String },

    #[error("{model} declares field '{field}' more than once")]
    #[diagnostic(code(cliquery::schema::duplicate_field))]
    DuplicateField { model: String, field: String },

    #[error("{model} declares reserved field '{field}'")]
    #[diagnostic(
        code(cliquery::schema::reserved_field),
        help("'id' and 'pk' are the implicit primary key of every model")
    )]
    ReservedField { model: String, field: String },

    #[error("reverse relation '{name}' on {model} clashes with an existing name")]
    #[diagnostic(
        code(cliquery::schema::relation_clash),
        help("set a distinct related_name on one of the foreign keys")
    )]
    RelationClash { model: String, name: String },

    #[error("invalid model definition in {filename}: {message}")]
    #[diagnostic(code(cliquery::schema::definition))]
    Definition { filename: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),
}

/// Lookup of applications and models by name
pub trait ModelRegistry {
    /// Names of all known applications, sorted
    fn application_names(&self) -> Vec<&str>;

    fn application(&self, name: &str) -> Result<&Application, SchemaError>;

    fn model(&self, app: &str, name: &str) -> Result<&ModelDef, SchemaError>;

    /// Look up a model by its `app.Model` label
    fn resolve(&self, label: &str) -> Result<&ModelDef, SchemaError>;

    /// Foreign keys of other models that point at `model`
    fn reverse_relations(&self, model: &ModelDef) -> &[ReverseRelation];
}

/// The loaded set of applications, with relations resolved
#[derive(Debug, Clone, Default)]
pub struct Schema {
    apps: BTreeMap<String, Application>,
    reverse: HashMap<String, Vec<ReverseRelation>>,
}

impl Schema {
    /// Build a registry from applications, resolving and checking relations
    pub fn new(apps: Vec<Application>) -> Result<Self, SchemaError> {
        let mut schema = Schema {
            apps: apps.into_iter().map(|a| (a.name.clone(), a)).collect(),
            reverse: HashMap::new(),
        };
        schema.link()?;
        Ok(schema)
    }

    /// Parse one application's models.yaml content
    pub fn parse_application(
        name: &str,
        content: &str,
        filename: &str,
    ) -> Result<Application, SchemaError> {
        let file: ModelsFile = parse_yaml(content, filename)?;
        let mut models = Vec::new();

        for (key, value) in file.models {
            let model_name = mapping_key(&key, filename)?;
            let spec: ModelSpec = serde_yml::from_value(value).map_err(|e| {
                SchemaError::Definition {
                    filename: filename.to_string(),
                    message: format!("model {}: {}", model_name, e),
                }
            })?;
            models.push(build_model(name, &model_name, spec, filename)?);
        }

        debug!(app = name, models = models.len(), "parsed application");
        Ok(Application {
            name: name.to_string(),
            models,
        })
    }

    /// Load an application from `<dir>/models.yaml`
    pub fn load_application(name: &str, dir: &Path) -> Result<Application, SchemaError> {
        let path = dir.join("models.yaml");
        let content = std::fs::read_to_string(&path).map_err(YamlError::from)?;
        Self::parse_application(name, &content, &path.display().to_string())
    }

    /// Resolve foreign key targets to labels and index reverse relations
    fn link(&mut self) -> Result<(), SchemaError> {
        let labels: Vec<String> = self
            .apps
            .values()
            .flat_map(|a| a.models.iter().map(|m| m.label()))
            .collect();

        let mut reverse: HashMap<String, Vec<ReverseRelation>> = HashMap::new();

        for app in self.apps.values_mut() {
            for model in app.models.iter_mut() {
                let model_label = model.label();
                let default_related = model.default_related_name();
                for field in model.fields.iter_mut().filter(|f| f.is_relation()) {
                    let target = field.to.as_deref().ok_or_else(|| SchemaError::MissingTarget {
                        model: model_label.clone(),
                        field: field.name.clone(),
                    })?;
                    let target_label = if target.contains('.') {
                        target.to_string()
                    } else {
                        format!("{}.{}", model.app, target)
                    };
                    if !labels.contains(&target_label) {
                        return Err(SchemaError::UnknownTarget {
                            model: model_label.clone(),
                            field: field.name.clone(),
                            target: target.to_string(),
                        });
                    }
                    field.to = Some(target_label.clone());

                    reverse.entry(target_label).or_default().push(ReverseRelation {
                        name: field
                            .related_name
                            .clone()
                            .unwrap_or_else(|| default_related.clone()),
                        model: model_label.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        }

        for (label, relations) in &reverse {
            let Some(model) = self.lookup_label(label) else {
                continue;
            };
            for (i, rel) in relations.iter().enumerate() {
                let clashes_field = model.field(&rel.name).is_some()
                    || model.field(&rel.attr_name()).is_some()
                    || PK_NAMES.contains(&rel.name.as_str());
                let clashes_relation = relations[..i].iter().any(|r| r.name == rel.name);
                if clashes_field || clashes_relation {
                    return Err(SchemaError::RelationClash {
                        model: label.clone(),
                        name: rel.name.clone(),
                    });
                }
            }
        }

        self.reverse = reverse;
        Ok(())
    }

    fn lookup_label(&self, label: &str) -> Option<&ModelDef> {
        let (app, name) = label.split_once('.')?;
        self.apps.get(app)?.model(name)
    }
}

impl ModelRegistry for Schema {
    fn application_names(&self) -> Vec<&str> {
        self.apps.keys().map(|k| k.as_str()).collect()
    }

    fn application(&self, name: &str) -> Result<&Application, SchemaError> {
        self.apps
            .get(name)
            .ok_or_else(|| SchemaError::UnknownApplication {
                name: name.to_string(),
                available: join_or_none(self.application_names()),
            })
    }

    fn model(&self, app: &str, name: &str) -> Result<&ModelDef, SchemaError> {
        let application = self.application(app)?;
        application
            .model(name)
            .ok_or_else(|| SchemaError::UnknownModel {
                app: app.to_string(),
                name: name.to_string(),
                available: join_or_none(application.model_names()),
            })
    }

    fn resolve(&self, label: &str) -> Result<&ModelDef, SchemaError> {
        match label.split_once('.') {
            Some((app, name)) => self.model(app, name),
            None => {
                let labels: Vec<String> = self
                    .apps
                    .values()
                    .flat_map(|a| a.models.iter().map(|m| m.label()))
                    .collect();
                Err(SchemaError::UnknownModel {
                    app: String::new(),
                    name: label.to_string(),
                    available: join_or_none(labels.iter().map(|s| s.as_str()).collect()),
                })
            }
        }
    }

    fn reverse_relations(&self, model: &ModelDef) -> &[ReverseRelation] {
        self.reverse
            .get(&model.label())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

fn build_model(
    app: &str,
    name: &str,
    spec: ModelSpec,
    filename: &str,
) -> Result<ModelDef, SchemaError> {
    let label = format!("{}.{}", app, name);
    let mut fields: Vec<FieldDef> = Vec::new();

    for (key, value) in spec.fields {
        let field_name = mapping_key(&key, filename)?;
        if PK_NAMES.contains(&field_name.as_str()) {
            return Err(SchemaError::ReservedField {
                model: label,
                field: field_name,
            });
        }
        if fields.iter().any(|f| f.name == field_name) {
            return Err(SchemaError::DuplicateField {
                model: label,
                field: field_name,
            });
        }
        let field: FieldSpec =
            serde_yml::from_value(value).map_err(|e| SchemaError::Definition {
                filename: filename.to_string(),
                message: format!("{}.{}: {}", label, field_name, e),
            })?;
        if field.kind != FieldKind::ForeignKey && field.to.is_some() {
            return Err(SchemaError::Definition {
                filename: filename.to_string(),
                message: format!("{}.{}: only foreign keys take 'to'", label, field_name),
            });
        }
        fields.push(FieldDef {
            name: field_name,
            kind: field.kind,
            to: field.to,
            related_name: field.related_name,
            choices: field.choices,
            null: field.null,
            help: field.help,
        });
    }

    Ok(ModelDef {
        app: app.to_string(),
        name: name.to_string(),
        fields,
        display: spec.display,
        ordering: spec.ordering,
    })
}

fn mapping_key(key: &serde_yml::Value, filename: &str) -> Result<String, SchemaError> {
    key.as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| SchemaError::Definition {
            filename: filename.to_string(),
            message: format!("expected a name, found {:?}", key),
        })
}

fn join_or_none(names: Vec<&str>) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}
