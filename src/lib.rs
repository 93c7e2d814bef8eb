//! xrayport -- export Xray Cloud test steps and preconditions to CSV/JSONL.
//!
//! One run is a straight pipeline: load config, authenticate, page through
//! `getTests` for a JQL filter, flatten each test's steps and preconditions
//! into table rows, write the table. The alternate diagnostics mode samples
//! a few tests and dumps every custom field id it sees.

pub mod config;
pub mod diagnostics;
pub mod export;
pub mod fetch;
pub mod flatten;
pub mod xray;

use anyhow::Result;
use std::time::Duration;

/// Settings for one export run, resolved from CLI flags.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub outfile: String,
    pub page_limit: u64,
    pub format: export::ExportFormat,
    pub policy: fetch::FailurePolicy,
    pub delay: Duration,
}

/// Run the full export pipeline: authenticate, fetch, flatten, write.
pub async fn run_export(opts: &ExportOptions) -> Result<()> {
    let cfg = config::Config::from_env()?;
    tracing::info!(client_id = %cfg.client_id_hint(), jql = %cfg.jql, "starting export");

    let client = xray::XrayClient::authenticate(&cfg.client_id, &cfg.client_secret).await?;
    tracing::info!("authenticated");

    let outcome = fetch::fetch_all(&client, &cfg.jql, opts.page_limit, opts.delay).await;
    let tests = fetch::resolve(outcome, opts.policy)?;
    tracing::info!(count = tests.len(), "test issues fetched");

    let rows = flatten::flatten_rows(&tests, &cfg.columns);
    export::write_rows(&opts.outfile, &rows, &cfg.columns, opts.format)?;
    tracing::info!(rows = rows.len(), outfile = %opts.outfile, "export written");

    println!("Done. Saved: {}", opts.outfile);
    Ok(())
}

/// Run the field-diagnostics mode: sample tests, dump the custom-field table.
pub async fn run_diagnostics(outfile: &str) -> Result<()> {
    let cfg = config::Config::from_env()?;
    tracing::info!(client_id = %cfg.client_id_hint(), jql = %cfg.jql, "starting field diagnostics");

    let client = xray::XrayClient::authenticate(&cfg.client_id, &cfg.client_secret).await?;
    tracing::info!("authenticated");

    diagnostics::run(&client, &cfg.jql, outfile).await
}
