//! GraphQL transport for the Xray Cloud API.

use super::model::GetTestsPage;
use super::{auth, Page, PageSource, XrayError};
use serde_json::{json, Value};
use std::time::Duration;

pub const GRAPHQL_URL: &str = "https://xray.cloud.getxray.app/api/v2/graphql";

/// Uniform deadline for every request; there are no retries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The step schema carries no `data` block on this deployment, only
/// precondition/action/result plus named custom fields.
const GET_TESTS_QUERY: &str = r#"
query ($jql: String!, $limit: Int!, $start: Int!) {
  getTests(jql: $jql, limit: $limit, start: $start) {
    total
    start
    limit
    results {
      jira(fields: ["*all"])
      steps { id action result customFields { name value } }
      preconditions(limit: 50) {
        results { jira(fields: ["key", "summary"]) definition }
      }
    }
  }
}"#;

/// Authenticated Xray Cloud client.
pub struct XrayClient {
    http: reqwest::Client,
    token: String,
}

impl XrayClient {
    /// Build the HTTP client and exchange credentials for a bearer token.
    pub async fn authenticate(client_id: &str, client_secret: &str) -> Result<Self, XrayError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("xrayport/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        let token = auth::get_token(&http, client_id, client_secret).await?;
        Ok(Self { http, token })
    }

    /// Execute one GraphQL request and return its `data` block.
    ///
    /// An `errors` array in the body is a failure even on HTTP 200.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, XrayError> {
        let resp = self
            .http
            .post(GRAPHQL_URL)
            .bearer_auth(&self.token)
            .json(&json!({"query": query, "variables": variables}))
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(XrayError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(XrayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = resp.json().await?;
        if let Some(errors) = body.get("errors").filter(|e| !e.is_null()) {
            return Err(XrayError::Graphql(errors.to_string()));
        }
        body.get("data")
            .cloned()
            .ok_or_else(|| XrayError::Graphql("response missing data".to_string()))
    }
}

#[async_trait::async_trait]
impl PageSource for XrayClient {
    async fn fetch_page(&self, jql: &str, limit: u64, start: u64) -> Result<Page, XrayError> {
        tracing::debug!(%start, %limit, "requesting getTests page");

        let data = self
            .graphql(
                GET_TESTS_QUERY,
                json!({"jql": jql, "limit": limit, "start": start}),
            )
            .await?;
        let envelope = data
            .get("getTests")
            .cloned()
            .ok_or_else(|| XrayError::Graphql("response missing getTests".to_string()))?;
        let page: GetTestsPage = serde_json::from_value(envelope)?;

        // The server's limit is authoritative for offset advancement; a page
        // without one cannot be paginated over, so that is a hard error
        // rather than a silent fallback to the requested limit.
        let limit = page
            .limit
            .ok_or_else(|| XrayError::Graphql("getTests page missing limit".to_string()))?;

        Ok(Page {
            total: page.total,
            limit,
            tests: page.results.unwrap_or_default(),
        })
    }
}
