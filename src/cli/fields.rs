//! `--list-fields`: what can be filtered, printed and updated on a model

use std::io::Write;

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{settings::Style, Table, Tabled};

use crate::cli::helpers::truncate_str;
use crate::schema::{ModelDef, ModelRegistry};

const MAX_CHOICES_WIDTH: usize = 40;

#[derive(Debug, Tabled)]
struct FieldRow {
    #[tabled(rename = "FIELD")]
    name: String,
    #[tabled(rename = "TYPE")]
    kind: String,
    #[tabled(rename = "RELATED")]
    related: String,
    #[tabled(rename = "NULL")]
    null: String,
    #[tabled(rename = "CHOICES")]
    choices: String,
    #[tabled(rename = "HELP")]
    help: String,
}

fn rows(registry: &dyn ModelRegistry, model: &ModelDef) -> Vec<FieldRow> {
    let mut rows = vec![FieldRow {
        name: "id".to_string(),
        kind: "integer (pk)".to_string(),
        related: String::new(),
        null: "no".to_string(),
        choices: String::new(),
        help: String::new(),
    }];

    rows.extend(model.fields.iter().map(|f| FieldRow {
        name: f.name.clone(),
        kind: f.kind.to_string(),
        related: f.to.clone().unwrap_or_default(),
        null: if f.null { "yes" } else { "no" }.to_string(),
        choices: truncate_str(&f.choice_values().join(", "), MAX_CHOICES_WIDTH),
        help: f.help.clone().unwrap_or_default(),
    }));

    rows.extend(registry.reverse_relations(model).iter().map(|r| FieldRow {
        name: r.attr_name(),
        kind: "reverse".to_string(),
        related: format!("{}.{}", r.model, r.field),
        null: String::new(),
        choices: String::new(),
        help: String::new(),
    }));

    rows
}

/// Print the model's fields, foreign keys and reverse relations as a table
pub fn write_field_table(
    out: &mut dyn Write,
    registry: &dyn ModelRegistry,
    model: &ModelDef,
) -> Result<()> {
    let table = Table::new(rows(registry, model))
        .with(Style::sharp())
        .to_string();

    writeln!(out, "{}", style(model.label()).bold()).into_diagnostic()?;
    writeln!(out, "{}", table).into_diagnostic()?;
    if let Some(display) = &model.display {
        writeln!(out, "display: {}", display).into_diagnostic()?;
    }
    if !model.ordering.is_empty() {
        writeln!(out, "ordering: {}", model.ordering.join(", ")).into_diagnostic()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    const SERVERS: &str = r#"
models:
  Server:
    display: "{name}"
    ordering: [name]
    fields:
      name: { type: char, help: Host name }
      status: { type: char, choices: [live, spare] }
  Interface:
    fields:
      server: { type: foreign_key, to: Server, null: true }
"#;

    #[test]
    fn test_rows_include_pk_and_reverse_relations() {
        let app = Schema::parse_application("servers", SERVERS, "models.yaml").unwrap();
        let schema = Schema::new(vec![app]).unwrap();
        let server = schema.model("servers", "Server").unwrap();

        let rows = rows(&schema, server);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "status", "interface_set"]);
        assert_eq!(rows[1].help, "Host name");
        assert_eq!(rows[2].choices, "live, spare");
        assert_eq!(rows[2].help, "");
        assert_eq!(rows[3].related, "servers.Interface.server");
    }

    #[test]
    fn test_table_output() {
        let app = Schema::parse_application("servers", SERVERS, "models.yaml").unwrap();
        let schema = Schema::new(vec![app]).unwrap();
        let iface = schema.model("servers", "Interface").unwrap();

        let mut out = Vec::new();
        write_field_table(&mut out, &schema, iface).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("servers.Interface"));
        assert!(text.contains("FIELD"));
        assert!(text.contains("servers.Server"));
        assert!(!text.contains("ordering:"));
    }
}
