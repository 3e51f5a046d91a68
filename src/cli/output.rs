//! Delimited output of query results

use std::io::Write;

use miette::{IntoDiagnostic, Result};

use crate::core::Record;
use crate::orm::{check_attr_path, resolve_attr, QueryError, Tables};
use crate::schema::ModelDef;

/// Split `name,server.name` into attribute paths
pub fn parse_field_list(fields: &str) -> Vec<String> {
    fields
        .split(',')
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

/// One line per record with the given attributes joined by `separator`
///
/// Every path is checked against the schema first, so a typo fails before
/// anything is written.
pub fn write_delimited(
    out: &mut dyn Write,
    tables: &Tables,
    model: &ModelDef,
    records: &[Record],
    fields: &[String],
    separator: &str,
    null_text: &str,
) -> Result<()> {
    for field in fields {
        check_attr_path(tables.registry(), model, field)?;
    }

    for record in records {
        let values = fields
            .iter()
            .map(|f| resolve_attr(tables, model, record, f)?.text(tables, null_text))
            .collect::<Result<Vec<_>, QueryError>>()?;
        writeln!(out, "{}", values.join(separator)).into_diagnostic()?;
    }
    Ok(())
}
