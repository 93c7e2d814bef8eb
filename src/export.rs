//! Tabular serialization of flattened rows -- CSV (RFC 4180) or JSONL.

use crate::flatten::{CustomColumn, FlatRow};
use anyhow::{Context, Result};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Jsonl,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "jsonl" => Some(ExportFormat::Jsonl),
            _ => None,
        }
    }
}

/// Column names in output order: the static columns with the configured
/// custom columns spliced in after Labels.
pub fn header(columns: &[CustomColumn]) -> Vec<String> {
    let mut names = vec![
        "Test Key".to_string(),
        "Summary".to_string(),
        "Labels".to_string(),
    ];
    names.extend(columns.iter().map(|c| c.label.clone()));
    names.extend(
        [
            "Step #",
            "Step Precondition",
            "Action",
            "Expected Result",
            "Issue Preconditions (keys & titles)",
            "Issue Preconditions Definition",
        ]
        .map(String::from),
    );
    names
}

/// Render header plus rows as CSV.
pub fn render_csv(rows: &[FlatRow], columns: &[CustomColumn]) -> String {
    let mut out = String::new();
    push_record(&mut out, &header(columns));
    for row in rows {
        push_record(&mut out, &row.values());
    }
    out
}

/// Render rows as JSONL, one object per row keyed by column name.
/// Step # is emitted as a number for step rows and "" for placeholder rows.
pub fn render_jsonl(rows: &[FlatRow], columns: &[CustomColumn]) -> Result<String> {
    let names = header(columns);
    let mut out = String::new();
    for row in rows {
        let mut object = serde_json::Map::new();
        for (name, value) in names.iter().zip(row.values()) {
            object.insert(name.clone(), Value::String(value));
        }
        if let Some(n) = row.step_number {
            object.insert("Step #".to_string(), Value::from(n as u64));
        }
        out.push_str(&serde_json::to_string(&Value::Object(object))?);
        out.push('\n');
    }
    Ok(out)
}

/// Serialize and write the export to `path`.
pub fn write_rows(
    path: &str,
    rows: &[FlatRow],
    columns: &[CustomColumn],
    format: ExportFormat,
) -> Result<()> {
    let body = match format {
        ExportFormat::Csv => render_csv(rows, columns),
        ExportFormat::Jsonl => render_jsonl(rows, columns)?,
    };
    std::fs::write(path, body).with_context(|| format!("writing {path}"))?;
    Ok(())
}

pub(crate) fn push_record(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_escape(field));
    }
    out.push('\n');
}

pub(crate) fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
