use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use xrayport::export::ExportFormat;
use xrayport::fetch::FailurePolicy;
use xrayport::xray::XrayError;
use xrayport::ExportOptions;

#[derive(Parser)]
#[command(
    name = "xrayport",
    about = "Export Xray Cloud test steps and preconditions to CSV/JSONL via JQL",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch tests by JQL and write the flattened step table
    Export {
        /// Output file path
        #[arg(long, default_value = "xray_tests.csv")]
        outfile: String,

        /// Number of tests to request per page
        #[arg(long, default_value = "100")]
        limit: u64,

        /// Output format: csv or jsonl
        #[arg(long, default_value = "csv")]
        format: String,

        /// Failure policy: empty-first-page, strict, or keep-partial
        #[arg(long = "on-error", default_value = "empty-first-page")]
        on_error: String,

        /// Pause between page requests, in milliseconds
        #[arg(long = "delay-ms", default_value = "200")]
        delay_ms: u64,
    },

    /// Sample a few tests and dump every custom field id with example values
    DiagnoseFields {
        /// Output file path
        #[arg(long, default_value = "field_diagnostics.csv")]
        outfile: String,
    },
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export {
            outfile,
            limit,
            format,
            on_error,
            delay_ms,
        } => {
            let format = ExportFormat::parse(&format)
                .ok_or_else(|| anyhow!("unknown format '{format}' (expected csv or jsonl)"))?;
            let policy = FailurePolicy::parse(&on_error).ok_or_else(|| {
                anyhow!("unknown policy '{on_error}' (expected empty-first-page, strict, or keep-partial)")
            })?;

            let opts = ExportOptions {
                outfile,
                page_limit: limit,
                format,
                policy,
                delay: Duration::from_millis(delay_ms),
            };
            xrayport::run_export(&opts).await
        }
        Commands::DiagnoseFields { outfile } => xrayport::run_diagnostics(&outfile).await,
    }
}

fn is_auth_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<XrayError>(), Some(XrayError::Auth { .. })))
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => {}
        Err(err) if is_auth_error(&err) => {
            eprintln!("error: authentication failed: {err:#}");
            eprintln!("Check the XRAY_CLIENT_ID and XRAY_CLIENT_SECRET values in your .env file.");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}
