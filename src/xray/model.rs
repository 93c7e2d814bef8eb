//! Shapes returned by the `getTests` GraphQL query.
//!
//! Everything coming back from Xray is optional in practice: tests without
//! steps, preconditions without a linked Jira issue, null entries inside
//! result lists. The model keeps all of that as `Option` and resolves to
//! empty values at the accessors, so downstream code never has to care.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One test issue as returned inside `getTests.results`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Test {
    /// Raw Jira field map (`jira(fields: ["*all"])`): key, summary, labels,
    /// and every `customfield_*` the instance defines.
    pub jira: Option<Map<String, Value>>,
    pub steps: Option<Vec<Step>>,
    pub preconditions: Option<PreconditionPage>,
}

impl Test {
    fn jira_value(&self, field: &str) -> Option<&Value> {
        self.jira.as_ref().and_then(|j| j.get(field))
    }

    /// A Jira field as plain text, empty when absent or not a string.
    pub fn jira_text(&self, field: &str) -> String {
        self.jira_value(field)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    }

    /// Labels joined with ", " in server order.
    pub fn labels_joined(&self) -> String {
        self.jira_value("labels")
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }

    /// Classified value of one custom field, `Empty` when the id is unknown.
    pub fn custom_field(&self, field_id: &str) -> CustomFieldValue {
        CustomFieldValue::classify(self.jira_value(field_id))
    }

    /// Every `customfield_*` id present on this test's Jira map.
    pub fn custom_field_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.jira
            .iter()
            .flat_map(|j| j.keys())
            .filter(|k| k.starts_with("customfield_"))
            .map(String::as_str)
    }

    pub fn step_list(&self) -> &[Step] {
        self.steps.as_deref().unwrap_or(&[])
    }

    /// Non-null precondition entries, in server order.
    pub fn precondition_list(&self) -> impl Iterator<Item = &Precondition> + '_ {
        self.preconditions
            .iter()
            .flat_map(|page| page.results.as_deref().unwrap_or(&[]))
            .flatten()
    }
}

/// One manual test step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Step {
    pub id: Option<String>,
    pub action: Option<String>,
    pub result: Option<String>,
    #[serde(rename = "customFields")]
    pub custom_fields: Option<Vec<StepCustomField>>,
}

impl Step {
    /// The step-level precondition override: value of the first custom field
    /// whose name is "precondition" (case-insensitive, declaration order).
    pub fn precondition_override(&self) -> Option<String> {
        self.custom_fields
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .find(|cf| {
                cf.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case("precondition"))
            })
            .map(|cf| cf.value.as_deref().unwrap_or("").trim().to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StepCustomField {
    pub name: Option<String>,
    pub value: Option<String>,
}

/// The `preconditions(limit: 50)` sub-page. Entries can be null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreconditionPage {
    pub results: Option<Vec<Option<Precondition>>>,
}

/// An issue-level precondition reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Precondition {
    pub jira: Option<Map<String, Value>>,
    pub definition: Option<String>,
}

impl Precondition {
    fn jira_text(&self, field: &str) -> Option<&str> {
        self.jira
            .as_ref()
            .and_then(|j| j.get(field))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// `"KEY - summary"` when both parts are present, otherwise nothing.
    pub fn title(&self) -> Option<String> {
        let key = self.jira_text("key")?;
        let summary = self.jira_text("summary")?;
        Some(format!("{key} - {summary}"))
    }
}

/// Raw `getTests` page envelope, before the fetcher validates it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetTestsPage {
    pub total: Option<u64>,
    pub limit: Option<u64>,
    pub results: Option<Vec<Test>>,
}

/// A Jira custom field value, classified by shape.
///
/// Jira serializes custom fields inconsistently: single-select options come
/// back as `{"value": "..."}`, multi-selects as a list of those, text fields
/// as plain scalars. Classification is total; formatting never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomFieldValue {
    Empty,
    Scalar(String),
    Choice(String),
    ChoiceList(Vec<String>),
}

impl CustomFieldValue {
    pub fn classify(raw: Option<&Value>) -> Self {
        match raw {
            None | Some(Value::Null) => CustomFieldValue::Empty,
            Some(Value::Object(map)) if map.contains_key("value") => {
                CustomFieldValue::Choice(scalar_text(&map["value"]))
            }
            Some(Value::Array(items)) => {
                CustomFieldValue::ChoiceList(items.iter().map(choice_text).collect())
            }
            Some(Value::String(s)) if s.is_empty() => CustomFieldValue::Empty,
            Some(Value::Bool(false)) => CustomFieldValue::Empty,
            Some(Value::Object(map)) if map.is_empty() => CustomFieldValue::Empty,
            Some(other) => CustomFieldValue::Scalar(scalar_text(other)),
        }
    }

    /// Render for one spreadsheet cell. Empty inputs always yield "".
    pub fn format(&self) -> String {
        match self {
            CustomFieldValue::Empty => String::new(),
            CustomFieldValue::Scalar(s) | CustomFieldValue::Choice(s) => s.clone(),
            CustomFieldValue::ChoiceList(items) => items
                .iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn choice_text(item: &Value) -> String {
    match item {
        Value::Object(map) if map.contains_key("value") => scalar_text(&map["value"]),
        other => scalar_text(other),
    }
}
