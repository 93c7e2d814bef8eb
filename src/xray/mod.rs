//! Xray Cloud API client -- authentication, GraphQL transport, data model.

pub mod auth;
pub mod client;
pub mod model;

pub use client::XrayClient;
pub use model::Test;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum XrayError {
    #[error("authentication rejected (HTTP {status})")]
    Auth { status: u16 },

    #[error("unexpected token response: {0}")]
    TokenShape(String),

    #[error("request failed (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL error: {0}")]
    Graphql(String),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// One page of `getTests` results, as validated by the client.
///
/// `total` stays optional: the server omitting it is meaningful to the
/// fetcher (treated as "nothing matched"), so the client must not invent
/// a default here.
#[derive(Debug, Default)]
pub struct Page {
    pub total: Option<u64>,
    pub limit: u64,
    pub tests: Vec<Test>,
}

/// One page request against the remote service.
///
/// The live implementation is [`XrayClient`]; tests script this trait to
/// drive the fetcher without a network.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page of tests matching `jql` at `start`, requesting up to
    /// `limit` entries. Fails loudly on transport or protocol errors.
    async fn fetch_page(&self, jql: &str, limit: u64, start: u64) -> Result<Page, XrayError>;
}
