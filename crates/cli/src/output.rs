//! Output formatting utilities

use advisor_lib::units::format_bytes;
use advisor_lib::{AdvisoryWarning, WarningKind};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Log record format on stderr
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Row for byte budget tables
#[derive(Tabled)]
pub struct BudgetRow {
    #[tabled(rename = "Setting")]
    pub setting: String,
    #[tabled(rename = "Bytes")]
    pub bytes: String,
    #[tabled(rename = "Size")]
    pub size: String,
}

impl BudgetRow {
    pub fn new(setting: impl Into<String>, bytes: u64) -> Self {
        Self {
            setting: setting.into(),
            bytes: bytes.to_string(),
            size: format_bytes(bytes),
        }
    }
}

/// Print rows as a rounded table
pub fn print_table(rows: Vec<BudgetRow>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message on a single stderr line
pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a warning on stderr, for commands whose stdout is machine input
pub fn eprint_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a warning by how soon it bites
pub fn color_warning(warning: &AdvisoryWarning) -> String {
    let text = warning.to_string();
    match warning.kind {
        WarningKind::ExplicitHeapFlagRequired => text.red().to_string(),
        WarningKind::NodePoolCapacityExceeded => text.yellow().to_string(),
    }
}
