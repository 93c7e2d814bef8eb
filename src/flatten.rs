//! Nested-to-flat transformation of fetched tests.
//!
//! Pure and deterministic: tests in, rows out, no I/O. Every test yields at
//! least one row -- a test without steps still gets a line in the export.

use crate::xray::model::Test;

/// One configured custom-field column: Jira field id plus the display name
/// it gets in the output header.
#[derive(Debug, Clone)]
pub struct CustomColumn {
    pub field_id: String,
    pub label: String,
}

impl CustomColumn {
    pub fn new(field_id: &str, label: &str) -> Self {
        Self {
            field_id: field_id.to_string(),
            label: label.to_string(),
        }
    }
}

/// One output table row.
///
/// `custom_values` runs parallel to the configured column list. `step_number`
/// is `None` for the placeholder row of a step-less test and renders as an
/// empty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    pub test_key: String,
    pub summary: String,
    pub labels: String,
    pub custom_values: Vec<String>,
    pub step_number: Option<usize>,
    pub step_precondition: String,
    pub action: String,
    pub expected_result: String,
    pub precondition_titles: String,
    pub precondition_definitions: String,
}

impl FlatRow {
    /// Cell values in column order, matching [`crate::export::header`].
    pub fn values(&self) -> Vec<String> {
        let mut values = vec![
            self.test_key.clone(),
            self.summary.clone(),
            self.labels.clone(),
        ];
        values.extend(self.custom_values.iter().cloned());
        values.push(
            self.step_number
                .map(|n| n.to_string())
                .unwrap_or_default(),
        );
        values.push(self.step_precondition.clone());
        values.push(self.action.clone());
        values.push(self.expected_result.clone());
        values.push(self.precondition_titles.clone());
        values.push(self.precondition_definitions.clone());
        values
    }
}

/// Collapse any run of whitespace to a single space and trim the ends.
/// Idempotent.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Flatten tests into rows, one per step (1-based), or a single row with
/// empty step fields when a test has no steps. Test order and step order
/// are preserved.
pub fn flatten_rows(tests: &[Test], columns: &[CustomColumn]) -> Vec<FlatRow> {
    let mut rows = Vec::new();

    for test in tests {
        let custom_values: Vec<String> = columns
            .iter()
            .map(|col| test.custom_field(&col.field_id).format())
            .collect();

        // Two independent lists: titles need key AND summary, definitions
        // only need non-empty text after normalization.
        let mut titles = Vec::new();
        let mut definitions = Vec::new();
        for pre in test.precondition_list() {
            if let Some(title) = pre.title() {
                titles.push(title);
            }
            if let Some(def) = pre.definition.as_deref() {
                let normalized = normalize_whitespace(def);
                if !normalized.is_empty() {
                    definitions.push(normalized);
                }
            }
        }

        let base = FlatRow {
            test_key: test.jira_text("key"),
            summary: test.jira_text("summary"),
            labels: test.labels_joined(),
            custom_values,
            step_number: None,
            step_precondition: String::new(),
            action: String::new(),
            expected_result: String::new(),
            precondition_titles: titles.join("; "),
            precondition_definitions: definitions.join(" | "),
        };

        let steps = test.step_list();
        if steps.is_empty() {
            rows.push(base);
        } else {
            for (idx, step) in steps.iter().enumerate() {
                let mut row = base.clone();
                row.step_number = Some(idx + 1);
                row.step_precondition = step.precondition_override().unwrap_or_default();
                row.action = step.action.as_deref().unwrap_or("").trim().to_string();
                row.expected_result = step.result.as_deref().unwrap_or("").trim().to_string();
                rows.push(row);
            }
        }
    }

    rows
}
