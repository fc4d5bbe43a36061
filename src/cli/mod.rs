//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{BoardCommand, MoveCommand, TemplatesCommand, ValidateCommand};
use std::ffi::OsString;

/// Recruiting pipeline board tool
#[derive(Debug, Parser, Clone)]
#[command(name = "hiring-pipeline")]
#[command(version = "0.1.0")]
#[command(about = "Kanban-style recruiting pipelines: templates, boards and stage moves", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Validate a pipeline template
    Validate(ValidateCommand),

    /// List available templates
    Templates(TemplatesCommand),

    /// Show the board of a snapshot
    Board(BoardCommand),

    /// Move a candidate to another stage
    Move(MoveCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
