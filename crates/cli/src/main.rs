//! Heapwise CLI
//!
//! A command-line tool that turns a measured memory profile into a runtime
//! heap limit, a container memory limit and a fleet budget.

mod commands;
mod config;
mod output;

use advisor_lib::{AdvisorError, StructuredLogger};
use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{patch, recommendations};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{AdvisorInput, InputArgs};
use crate::output::{print_error, LogFormat, OutputFormat};

/// Exit code for rejected input
const EXIT_INVALID_INPUT: u8 = 2;

/// Exit code for a violated advisor postcondition (EX_SOFTWARE)
const EXIT_INTERNAL: u8 = 70;

/// Heapwise memory budget advisor
#[derive(Parser)]
#[command(name = "heapwise")]
#[command(author, version, about = "Memory budget advisor for heap and container limits", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Workload label used in logs (can also be set via HEAPWISE_WORKLOAD env var)
    #[arg(long, short, global = true, env = "HEAPWISE_WORKLOAD", default_value = "default")]
    pub workload: String,

    /// Enable verbose logging on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log record format on stderr
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend heap and container memory limits
    Recommend {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Show the total memory the fleet of replicas must reserve
    Fleet {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print a Kubernetes strategic-merge patch applying the recommendation
    Patch {
        /// Container name inside the pod template
        #[arg(long, short)]
        container: String,

        #[command(flatten)]
        input: InputArgs,
    },
}

/// Logging is opt-in: stdout and stderr are the product of this tool
fn init_tracing(verbose: bool, format: LogFormat) {
    let default_directive = if verbose { "debug" } else { "off" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn run(cli: Cli) -> Result<()> {
    let logger = StructuredLogger::new(&cli.workload);

    match cli.command {
        Commands::Recommend { input } => {
            let input = AdvisorInput::load(&input)?;
            recommendations::recommend(&input, &logger, cli.format)
        }
        Commands::Fleet { input } => {
            let input = AdvisorInput::load(&input)?;
            recommendations::fleet(&input, &logger, cli.format)
        }
        Commands::Patch { container, input } => {
            let input = AdvisorInput::load(&input)?;
            patch::patch(&input, &logger, &container)
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<AdvisorError>() {
        Some(AdvisorError::InternalInconsistency { .. }) => EXIT_INTERNAL,
        // Unreadable or malformed input documents are input errors too.
        _ => EXIT_INVALID_INPUT,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::from(exit_code(&e))
        }
    }
}
