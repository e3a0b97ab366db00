//! `recall` maintenance CLI.
//!
//! ```bash
//! recall media-dir
//! recall check-media
//! recall ingest 3f9c2a
//! RECALL_LOG=debug recall clean-media
//! ```
//!
//! Logging goes to stderr; `RECALL_LOG` takes an `EnvFilter` directive and
//! `RECALL_LOG_FORMAT=json` switches to JSON lines.

mod cli;
mod error;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "recall=info,recall_config=info,recall_store=info,recall_media=info";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let log_format = std::env::var("RECALL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_env("RECALL_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    match log_format.as_str() {
        "json" => tracing_subscriber::registry().with(filter).with(fmt.json()).init(),
        _ => tracing_subscriber::registry().with(filter).with(fmt).init(),
    }

    let cli = cli::Cli::parse();
    match cli::execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:?}");
            ExitCode::FAILURE
        },
    }
}
