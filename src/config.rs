//! Environment configuration -- credentials, JQL, export columns.

use crate::flatten::CustomColumn;
use anyhow::{bail, Result};

/// Everything the run needs from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub jql: String,
    /// Custom-field columns to export, in output order.
    pub columns: Vec<CustomColumn>,
}

impl Config {
    /// Load from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let client_id = clean(&env_or_empty("XRAY_CLIENT_ID"));
        let client_secret = clean(&env_or_empty("XRAY_CLIENT_SECRET"));
        let jql = clean(&env_or_empty("JIRA_JQL"));

        if client_id.is_empty() || client_secret.is_empty() {
            bail!("XRAY_CLIENT_ID and XRAY_CLIENT_SECRET must be set (environment or .env)");
        }
        if jql.is_empty() {
            bail!("JIRA_JQL must be set (environment or .env)");
        }

        Ok(Self {
            client_id,
            client_secret,
            jql,
            columns: default_columns(),
        })
    }

    /// Redacted form of the client id for log lines.
    pub fn client_id_hint(&self) -> String {
        if self.client_id.len() > 8 {
            format!(
                "{}...{}",
                &self.client_id[..4],
                &self.client_id[self.client_id.len() - 4..]
            )
        } else {
            "****".to_string()
        }
    }
}

/// Custom-field columns exported by default. Field ids are instance-specific;
/// run `xrayport diagnose-fields` to find the ones for your Jira site.
pub fn default_columns() -> Vec<CustomColumn> {
    vec![
        CustomColumn::new("customfield_10138", "Components"),
        CustomColumn::new("customfield_10167", "Custom Field 2"),
    ]
}

fn env_or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

/// Strip surrounding whitespace and stray quote characters that tend to
/// sneak into copy-pasted .env values.
pub(crate) fn clean(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .to_string()
}
