//! # CLI Module
//!
//! ## Available Commands
//!
//! - `assess` - Run the four-stage assessment and write the launch report
//! - `score` - Validate a survey and print or write it with derived scores
//! - `validate` - Check a survey without generating anything
//! - `server` - Start the HTTP server

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::AppError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// samd-launch - SaMD market launch assessor
///
/// Scores candidate markets from a CSV or xlsx survey and runs each one
/// through risk, opportunity, readiness and decision stages.
#[derive(Parser, Debug)]
#[command(name = "samd-launch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner and progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./samd-launch.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long = "json", global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assess every market in a survey and write the launch report
    Assess {
        /// Survey file (.csv or .xlsx)
        #[arg(short, long)]
        input: PathBuf,

        /// Launch report CSV to write
        #[arg(short, long, default_value = "launch_report.csv")]
        output: PathBuf,

        /// Use the deterministic offline provider (no network, no API key)
        #[arg(long)]
        offline: bool,
    },

    /// Print or write the survey with Risk_Score and Readiness_Score
    Score {
        /// Survey file (.csv or .xlsx)
        #[arg(short, long)]
        input: PathBuf,

        /// Scored CSV to write (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a survey without running any stage
    Validate {
        /// Survey file (.csv or .xlsx)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Use the deterministic offline provider (no network, no API key)
        #[arg(long)]
        offline: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let config = cli.config.as_deref();
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Assess {
            input,
            output,
            offline,
        } => {
            let options = AssessOptions {
                input: &input,
                output: &output,
                offline,
                json_mode,
                quiet: cli.quiet,
            };
            cmd_assess(config, &options).await
        }
        Commands::Score { input, output } => cmd_score(&input, output.as_deref(), json_mode),
        Commands::Validate { input } => cmd_validate(&input, json_mode),
        Commands::Server {
            host,
            port,
            offline,
        } => cmd_server(config, &host, port, offline).await,
    }
}
