//! Model and field definitions loaded from `<app>/models.yaml`

use serde::{Deserialize, Serialize};

/// Names every model answers to for its primary key
pub const PK_NAMES: [&str; 2] = ["id", "pk"];

/// Storage kind of a model field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[serde(alias = "string")]
    Char,
    Text,
    #[serde(alias = "int")]
    Integer,
    Float,
    #[serde(alias = "bool")]
    Boolean,
    Date,
    #[serde(rename = "datetime", alias = "timestamp")]
    DateTime,
    #[serde(alias = "fk")]
    ForeignKey,
}

impl FieldKind {
    /// Whether values of this kind are compared as text
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldKind::Char | FieldKind::Text)
    }

    /// Whether values of this kind have a meaningful ordering for range lookups
    pub fn is_ordered(&self) -> bool {
        !matches!(self, FieldKind::Boolean)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Char => write!(f, "char"),
            FieldKind::Text => write!(f, "text"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::DateTime => write!(f, "datetime"),
            FieldKind::ForeignKey => write!(f, "foreign_key"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChoice {
    Labeled {
        value: serde_json::Value,
        #[serde(default)]
        label: Option<String>,
    },
    Bare(serde_json::Value),
}

/// One allowed value of an enumerated field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawChoice")]
pub struct Choice {
    pub value: String,
    pub label: Option<String>,
}

impl From<RawChoice> for Choice {
    fn from(raw: RawChoice) -> Self {
        match raw {
            RawChoice::Labeled { value, label } => Choice {
                value: scalar_text(&value),
                label,
            },
            RawChoice::Bare(value) => Choice {
                value: scalar_text(&value),
                label: None,
            },
        }
    }
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Field declaration as written in models.yaml
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Target model of a foreign key (`Model` or `app.Model`)
    #[serde(default)]
    pub to: Option<String>,

    /// Name of the reverse relation on the target model
    #[serde(default)]
    pub related_name: Option<String>,

    #[serde(default)]
    pub choices: Vec<Choice>,

    #[serde(default)]
    pub null: bool,

    #[serde(default)]
    pub help: Option<String>,
}

/// Model declaration as written in models.yaml
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    #[serde(default)]
    pub display: Option<String>,

    #[serde(default)]
    pub ordering: Vec<String>,

    /// Field name to declaration, in declaration order
    #[serde(default)]
    pub fields: serde_yml::Mapping,
}

/// Top level of a models.yaml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsFile {
    #[serde(default)]
    pub models: serde_yml::Mapping,
}

/// A resolved field of a model
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Label (`app.Model`) of the target model for foreign keys
    pub to: Option<String>,
    pub related_name: Option<String>,
    pub choices: Vec<Choice>,
    pub null: bool,
    pub help: Option<String>,
}

impl FieldDef {
    pub fn is_relation(&self) -> bool {
        self.kind == FieldKind::ForeignKey
    }

    /// Allowed raw values, empty when the field is not enumerated
    pub fn choice_values(&self) -> Vec<&str> {
        self.choices.iter().map(|c| c.value.as_str()).collect()
    }
}

/// A model of an application
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDef {
    pub app: String,
    pub name: String,
    pub fields: Vec<FieldDef>,
    /// Format string used to show a record, e.g. `"{name} ({assettag})"`
    pub display: Option<String>,
    pub ordering: Vec<String>,
}

impl ModelDef {
    /// Registry label, `app.Model`
    pub fn label(&self) -> String {
        format!("{}.{}", self.app, self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Default reverse relation name when the foreign key doesn't set one
    pub fn default_related_name(&self) -> String {
        self.name.to_lowercase()
    }
}

/// A foreign key seen from the model it points to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseRelation {
    /// Name used in filter paths (`interface__mac_address`)
    pub name: String,
    /// Label of the model holding the foreign key
    pub model: String,
    /// Foreign key field on that model
    pub field: String,
}

impl ReverseRelation {
    /// Attribute name used in field paths and templates (`interface_set`)
    pub fn attr_name(&self) -> String {
        format!("{}_set", self.name)
    }
}

/// An application and its models
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub name: String,
    pub models: Vec<ModelDef>,
}

impl Application {
    pub fn model(&self, name: &str) -> Option<&ModelDef> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_forms() {
        let choices: Vec<Choice> =
            serde_yml::from_str("- active\n- {value: retired, label: Retired}\n- 3").unwrap();
        assert_eq!(choices[0].value, "active");
        assert_eq!(choices[0].label, None);
        assert_eq!(choices[1].value, "retired");
        assert_eq!(choices[1].label.as_deref(), Some("Retired"));
        assert_eq!(choices[2].value, "3");
    }

    #[test]
    fn test_field_kind_aliases() {
        let spec: FieldSpec = serde_yml::from_str("type: string").unwrap();
        assert_eq!(spec.kind, FieldKind::Char);
        let spec: FieldSpec = serde_yml::from_str("type: fk\nto: Server").unwrap();
        assert_eq!(spec.kind, FieldKind::ForeignKey);
        assert_eq!(spec.to.as_deref(), Some("Server"));
    }

    #[test]
    fn test_unknown_field_key_rejected() {
        let result: Result<FieldSpec, _> = serde_yml::from_str("type: char\nlength: 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_reverse_attr_name() {
        let rel = ReverseRelation {
            name: "interface".to_string(),
            model: "servers.Interface".to_string(),
            field: "server".to_string(),
        };
        assert_eq!(rel.attr_name(), "interface_set");
    }
}
