use anyhow::{Context, Result};
use hiring_pipeline::cli::commands::{BoardCommand, MoveCommand, TemplatesCommand, ValidateCommand};
use hiring_pipeline::cli::output::*;
use hiring_pipeline::cli::{Cli, Command};
use hiring_pipeline::core::config::{discover_templates, templates_dir, BoardSnapshot, PipelineTemplateConfig};
use hiring_pipeline::core::templates::BUILTIN_TEMPLATES;
use hiring_pipeline::layout::{FixedWidth, TerminalWidth};
use hiring_pipeline::{
    DropOutcome, InMemoryCandidateStore, LayoutConstants, LayoutTrigger, Pipeline, PipelineBoard,
    WidthProvider,
};
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Validate(cmd) => validate_template(cmd)?,
        Command::Templates(cmd) => list_templates(cmd)?,
        Command::Board(cmd) => show_board(cmd).await?,
        Command::Move(cmd) => move_candidate(cmd).await?,
    }

    Ok(())
}

fn validate_template(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating template...", INFO);

    match PipelineTemplateConfig::from_file(&cmd.file) {
        Ok(config) => {
            let draft = config.to_draft(None);
            println!("{} Template is valid!", CHECK);
            println!("  Name: {}", style(&draft.name).bold());
            println!("  Stages: {}", style(draft.stages.len()).cyan());
            println!("{}", format_stage_list(&draft.stages.iter().collect::<Vec<_>>()));

            if cmd.json {
                let json = serde_json::to_string_pretty(&draft)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn list_templates(cmd: &TemplatesCommand) -> Result<()> {
    let dir = templates_dir();
    let discovered = discover_templates(&dir)
        .with_context(|| format!("Failed to read templates from {}", dir.display()))?;

    if cmd.json {
        let mut templates: Vec<serde_json::Value> = BUILTIN_TEMPLATES
            .iter()
            .map(|t| {
                serde_json::json!({
                    "key": t.key,
                    "name": t.name,
                    "description": t.description,
                    "stages": t.stages,
                    "builtin": true,
                })
            })
            .collect();
        for (path, config) in &discovered {
            if let Ok(config) = config {
                templates.push(serde_json::json!({
                    "path": path.display().to_string(),
                    "name": config.name,
                    "description": config.description,
                    "stages": config.stages.iter().map(|s| s.name.clone()).collect::<Vec<_>>(),
                    "builtin": false,
                }));
            }
        }
        let data = serde_json::json!({ "templates": templates });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Built-in templates:", INFO);
    for template in &BUILTIN_TEMPLATES {
        println!(
            "  {} - {} ({} stages)",
            style(template.key).bold(),
            template.name,
            style(template.stages.len()).cyan()
        );
        if cmd.stages {
            println!("    {}", style(template.stages.join(" → ")).dim());
        }
    }

    if discovered.is_empty() {
        println!(
            "\n{} No user templates in {}",
            INFO,
            style(dir.display()).dim()
        );
        return Ok(());
    }

    println!("\n{} User templates ({}):", INFO, style(dir.display()).dim());
    for (path, config) in &discovered {
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        match config {
            Ok(config) => {
                println!(
                    "  {} - {} ({} stages)",
                    style(&file).bold(),
                    config.name,
                    style(config.stages.len()).cyan()
                );
                if cmd.stages {
                    let names: Vec<&str> = config.stages.iter().map(|s| s.name.trim()).collect();
                    println!("    {}", style(names.join(" → ")).dim());
                }
            }
            Err(e) => println!("  {} {}: {}", WARN, style(&file).yellow(), style(e).dim()),
        }
    }

    Ok(())
}

/// Board over an in-memory store seeded from a snapshot file
async fn load_board(
    file: &str,
    job: Option<&str>,
) -> Result<(PipelineBoard<InMemoryCandidateStore>, LayoutConstants)> {
    let snapshot = BoardSnapshot::from_file(file)
        .with_context(|| format!("Failed to load board snapshot {}", file))?;

    let constants = snapshot.layout.unwrap_or_else(LayoutConstants::terminal);
    constants.validate().context("Invalid layout constants")?;

    let job_id = job.map(str::to_string).unwrap_or_else(|| snapshot.job_id.clone());
    let store = Arc::new(InMemoryCandidateStore::new(snapshot.candidates));
    let mut board = PipelineBoard::new(store, snapshot.pipeline, job_id, constants);
    board.refresh().await.context("Failed to load candidates")?;

    Ok((board, constants))
}

fn width_provider(width: Option<u32>) -> Box<dyn WidthProvider> {
    match width {
        Some(width) => Box::new(FixedWidth(width)),
        None => Box::new(TerminalWidth::default()),
    }
}

fn print_board(
    board: &PipelineBoard<InMemoryCandidateStore>,
    constants: &LayoutConstants,
    trigger: LayoutTrigger,
    width: Option<u32>,
) {
    let provider = width_provider(width);
    let layout = board.layout(trigger, provider.as_ref());
    let grouping = board.grouping().unwrap_or_default();

    println!(
        "{} {} (job {})",
        INFO,
        style(&board.pipeline().name).bold(),
        style(board.job_id()).dim()
    );
    for warning in &grouping.warnings {
        println!("{}", format_warning(warning));
    }
    println!("{}", render_board(board.pipeline(), &grouping, &layout, constants));

    if matches!(layout, hiring_pipeline::ColumnLayout::Uniform { overflows: true, .. }) {
        println!(
            "{} Board is wider than {} columns of text",
            WARN,
            provider.available_width()
        );
    }
}

async fn show_board(cmd: &BoardCommand) -> Result<()> {
    let (board, constants) = load_board(&cmd.file, cmd.job.as_deref()).await?;

    if cmd.json {
        let provider = width_provider(cmd.width);
        let grouping = board.grouping().unwrap_or_default();
        let data = serde_json::json!({
            "jobId": board.job_id(),
            "pipeline": board.pipeline(),
            "grouping": &*grouping,
            "layout": board.layout(LayoutTrigger::Resize, provider.as_ref()),
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    print_board(&board, &constants, LayoutTrigger::Resize, cmd.width);
    Ok(())
}

/// Stage id for `target`, matched by id first, then by name
fn resolve_stage<'a>(pipeline: &'a Pipeline, target: &'a str) -> &'a str {
    if pipeline.contains_stage(target) {
        return target;
    }
    pipeline
        .stages
        .iter()
        .find(|s| s.name.trim().eq_ignore_ascii_case(target.trim()))
        .map(|s| s.id.as_str())
        .unwrap_or(target)
}

async fn move_candidate(cmd: &MoveCommand) -> Result<()> {
    let (mut board, constants) = load_board(&cmd.file, cmd.job.as_deref()).await?;
    board.add_event_handler(|event| println!("{}", format_drag_event(&event)));

    let target = resolve_stage(board.pipeline(), &cmd.to).to_string();
    board.start_drag(&cmd.candidate)?;
    board.hover(Some(&target));

    match board.drop_on(Some(&target))? {
        DropOutcome::Committed(commit) => {
            if let Err(e) = commit.wait().await {
                error!("{}", e);
                std::process::exit(1);
            }
            board.refresh().await.context("Failed to reload candidates")?;
        }
        DropOutcome::Unchanged | DropOutcome::Dismissed => {}
    }

    println!();
    print_board(&board, &constants, LayoutTrigger::Resize, cmd.width);
    Ok(())
}
