//! # samd-launch
//!
//! Assesses candidate markets for a Software-as-a-Medical-Device launch.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                 apps/samd-launch (THE BINARY)              │
//! │                                                            │
//! │  ┌───────────┐   ┌───────────┐   ┌──────────────────────┐  │
//! │  │    CLI    │   │  HTTP API │   │   Pipeline Runner    │  │
//! │  │  (clap)   │   │  (axum)   │──▶│ retry, gate, stages  │  │
//! │  └─────┬─────┘   └─────┬─────┘   └──────────┬───────────┘  │
//! │        └───────────────┴────────────────────┤              │
//! │                                             ▼              │
//! │   ┌──────────────────┐            ┌──────────────────────┐ │
//! │   │ samd-launch-core │            │ GenerationProvider   │ │
//! │   │   (THE LOGIC)    │            │ (OpenAI-compatible,  │ │
//! │   └──────────────────┘            │  offline)            │ │
//! │                                   └──────────────────────┘ │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! samd-launch validate -i survey.csv
//! samd-launch score -i survey.csv -o scored.csv
//! SAMD_API_KEY=sk-... samd-launch assess -i survey.csv -o launch_report.csv
//! samd-launch assess -i survey.csv --offline
//! samd-launch server --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use samd_launch::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // SAMD_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SAMD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "samd_launch=debug,tower_http=debug"
    } else {
        "samd_launch=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so `score` can stream CSV on stdout.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn print_banner() {
    eprintln!(
        "samd-launch v{} - SaMD market launch assessor",
        env!("CARGO_PKG_VERSION")
    );
}
