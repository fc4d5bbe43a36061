//! CLI command definitions

use clap::Args;

/// Validate a pipeline template
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to template YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List built-in and user templates
#[derive(Debug, Args, Clone)]
pub struct TemplatesCommand {
    /// Show the stages of each template
    #[arg(long)]
    pub stages: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Render the board of a snapshot
#[derive(Debug, Args, Clone)]
pub struct BoardCommand {
    /// Path to board snapshot (YAML or JSON)
    #[arg(short, long)]
    pub file: String,

    /// Job to show (defaults to the snapshot's job)
    #[arg(short, long)]
    pub job: Option<String>,

    /// Available width in character cells (defaults to the terminal width)
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Drag a candidate to another stage
#[derive(Debug, Args, Clone)]
pub struct MoveCommand {
    /// Path to board snapshot (YAML or JSON)
    #[arg(short, long)]
    pub file: String,

    /// Candidate id
    #[arg(short, long)]
    pub candidate: String,

    /// Target stage id or name
    #[arg(short, long)]
    pub to: String,

    /// Job to use (defaults to the snapshot's job)
    #[arg(short, long)]
    pub job: Option<String>,

    /// Available width in character cells (defaults to the terminal width)
    #[arg(short, long)]
    pub width: Option<u32>,
}
