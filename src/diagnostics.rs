//! Field diagnostics -- help the operator find custom field ids.
//!
//! Jira custom field ids (`customfield_12345`) are instance-specific and not
//! discoverable from names alone. This mode samples a few tests, formats
//! every custom field it sees, and writes a field-id-by-test table so the
//! operator can spot which id holds the column they want to export.

use crate::export::{csv_escape, push_record};
use crate::xray::{PageSource, Test};
use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;

/// How many tests to sample for the table.
const SAMPLE_LIMIT: u64 = 5;

/// Formatted values of every observed custom field across a sample.
#[derive(Debug)]
pub struct FieldTable {
    /// Sampled test keys, in fetch order ("N/A" when a test has no key).
    pub test_keys: Vec<String>,
    /// (field id, value per sampled test), sorted by field id.
    pub fields: Vec<(String, Vec<String>)>,
}

/// Build the diagnostics table from a sample of tests.
pub fn build_field_table(tests: &[Test]) -> FieldTable {
    let test_keys: Vec<String> = tests
        .iter()
        .map(|t| {
            let key = t.jira_text("key");
            if key.is_empty() {
                "N/A".to_string()
            } else {
                key
            }
        })
        .collect();

    let mut ids: BTreeSet<String> = BTreeSet::new();
    for test in tests {
        ids.extend(test.custom_field_ids().map(str::to_string));
    }

    let fields = ids
        .into_iter()
        .map(|id| {
            let values = tests
                .iter()
                .map(|t| t.custom_field(&id).format())
                .collect();
            (id, values)
        })
        .collect();

    FieldTable { test_keys, fields }
}

/// Render the table as CSV: one row per field id, one column per test.
pub fn render_csv(table: &FieldTable) -> String {
    let mut out = String::new();
    out.push_str("Field ID");
    for key in &table.test_keys {
        out.push(',');
        out.push_str(&csv_escape(key));
    }
    out.push('\n');

    for (id, values) in &table.fields {
        let mut record = Vec::with_capacity(values.len() + 1);
        record.push(id.clone());
        record.extend(values.iter().cloned());
        push_record(&mut out, &record);
    }
    out
}

/// Fetch a sample and write the diagnostics table to `outfile`.
pub async fn run(source: &dyn PageSource, jql: &str, outfile: &str) -> Result<()> {
    tracing::info!(%jql, "fetching sample tests for field diagnostics");
    let page = source.fetch_page(jql, SAMPLE_LIMIT, 0).await?;
    if page.tests.is_empty() {
        bail!("no tests matched the JQL; nothing to diagnose");
    }
    tracing::info!(count = page.tests.len(), "sample fetched");

    let table = build_field_table(&page.tests);
    std::fs::write(outfile, render_csv(&table)).with_context(|| format!("writing {outfile}"))?;

    println!("Diagnostics written to {outfile}.");
    println!("Each row is one custom field id with its value per sampled test.");
    println!("Find the id whose values match the column you want, then add it");
    println!("to the export column list in config.rs.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<Test> {
        vec![
            serde_json::from_value(json!({
                "jira": {
                    "key": "TEST-1",
                    "summary": "s",
                    "customfield_10138": {"value": "Backend"},
                    "customfield_10200": "notes"
                }
            }))
            .unwrap(),
            serde_json::from_value(json!({
                "jira": {
                    "key": "TEST-2",
                    "customfield_10167": [{"value": "A"}, {"value": "B"}]
                }
            }))
            .unwrap(),
        ]
    }

    #[test]
    fn table_covers_every_observed_field_id() {
        let table = build_field_table(&sample());
        let ids: Vec<_> = table.fields.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["customfield_10138", "customfield_10167", "customfield_10200"]
        );
        assert_eq!(table.test_keys, vec!["TEST-1", "TEST-2"]);
    }

    #[test]
    fn values_use_the_shared_formatter() {
        let table = build_field_table(&sample());
        let by_id: std::collections::HashMap<_, _> = table
            .fields
            .iter()
            .map(|(id, values)| (id.as_str(), values))
            .collect();

        assert_eq!(by_id["customfield_10138"], &vec!["Backend".to_string(), String::new()]);
        assert_eq!(by_id["customfield_10167"], &vec![String::new(), "A, B".to_string()]);
        assert_eq!(by_id["customfield_10200"], &vec!["notes".to_string(), String::new()]);
    }

    #[test]
    fn missing_key_renders_as_na() {
        let tests: Vec<Test> = vec![serde_json::from_value(json!({
            "jira": {"customfield_10001": "x"}
        }))
        .unwrap()];
        let table = build_field_table(&tests);
        assert_eq!(table.test_keys, vec!["N/A"]);
    }

    #[test]
    fn csv_layout_is_field_id_by_test_key() {
        let table = build_field_table(&sample());
        let out = render_csv(&table);
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap(), "Field ID,TEST-1,TEST-2");
        assert_eq!(lines.next().unwrap(), "customfield_10138,Backend,");
        assert_eq!(lines.next().unwrap(), "customfield_10167,,\"A, B\"");
    }
}
