//! Xray Cloud token acquisition.

use super::XrayError;
use serde_json::{json, Value};

pub const AUTH_URL: &str = "https://xray.cloud.getxray.app/api/v2/authenticate";

/// Exchange API client credentials for a bearer token.
///
/// The endpoint returns a bare JSON string on success; anything else is a
/// protocol error. 401/403 map to the distinct auth variant so the CLI can
/// report a credential problem instead of a generic failure.
pub async fn get_token(
    http: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
) -> Result<String, XrayError> {
    let resp = http
        .post(AUTH_URL)
        .json(&json!({"client_id": client_id, "client_secret": client_secret}))
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

    match resp.json::<Value>().await? {
        Value::String(token) => Ok(token),
        other => Err(XrayError::TokenShape(other.to_string())),
    }
}
