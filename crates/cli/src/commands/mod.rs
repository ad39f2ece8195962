//! CLI subcommands

pub mod patch;
pub mod recommendations;
