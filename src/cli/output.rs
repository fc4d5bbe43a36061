//! CLI output formatting

use crate::{
    core::{Pipeline, Stage},
    drag::DragEvent,
    grouping::{GroupingWarning, StageGrouping},
    layout::{ColumnLayout, LayoutConstants},
};
use console::{pad_str, Alignment, Emoji};

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static HAND: Emoji<'_, '_> = Emoji("✋ ", "> ");

/// Format a drag event for display
pub fn format_drag_event(event: &DragEvent) -> String {
    match event {
        DragEvent::Started {
            candidate_id,
            origin_stage_id,
        } => format!(
            "{} Picked up {} from {}",
            HAND,
            style(candidate_id).bold(),
            style(origin_stage_id.as_deref().unwrap_or("-")).dim()
        ),
        DragEvent::Hovered {
            candidate_id,
            stage_id,
        } => format!(
            "{} {} over {}",
            INFO,
            style(candidate_id).dim(),
            style(stage_id.as_deref().unwrap_or("nothing")).cyan()
        ),
        DragEvent::Cancelled { candidate_id } => {
            format!("{} Drag of {} cancelled", WARN, style(candidate_id).yellow())
        }
        DragEvent::Dismissed { candidate_id } => format!(
            "{} {} dropped outside the board, nothing changed",
            INFO,
            style(candidate_id).dim()
        ),
        DragEvent::Unchanged {
            candidate_id,
            stage_id,
        } => format!(
            "{} {} is already in {}",
            INFO,
            style(candidate_id).dim(),
            style(stage_id).cyan()
        ),
        DragEvent::CommitIssued {
            candidate_id,
            stage_id,
            ..
        } => format!(
            "{} Moving {} → {}",
            SPINNER,
            style(candidate_id).bold(),
            style(stage_id).cyan()
        ),
        DragEvent::CommitSucceeded {
            candidate_id,
            stage_id,
        } => format!(
            "{} {} → {}",
            CHECK,
            style(candidate_id).green(),
            style(stage_id).cyan()
        ),
        DragEvent::CommitFailed {
            candidate_id,
            stage_id,
            error,
        } => format!(
            "{} {} → {}: {}",
            CROSS,
            style(candidate_id).red(),
            style(stage_id).dim(),
            style(error).dim()
        ),
    }
}

/// Format a grouping warning for display
pub fn format_warning(warning: &GroupingWarning) -> String {
    match warning {
        GroupingWarning::StageNotFound {
            candidate_id,
            stage_id,
        } => format!(
            "{} {} references unknown stage {}, shown in the lowest-order stage",
            WARN,
            style(candidate_id).yellow(),
            style(stage_id).dim()
        ),
    }
}

/// One line per stage: order, name, color, icon
pub fn format_stage_list(stages: &[&Stage]) -> String {
    stages
        .iter()
        .map(|stage| {
            let mut line = format!(
                "  {}. {} {} {}",
                stage.order,
                style(&stage.name).bold(),
                style(&stage.color).dim(),
                style(&stage.icon).dim()
            );
            if !stage.is_active {
                line.push_str(&format!(" {}", style("(inactive)").yellow()));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the board as side-by-side columns
pub fn render_board(
    pipeline: &Pipeline,
    grouping: &StageGrouping,
    layout: &ColumnLayout,
    constants: &LayoutConstants,
) -> String {
    let ColumnLayout::Uniform { column_width, .. } = *layout else {
        let mut out = format!("{} {} has no stages", WARN, style(&pipeline.name).bold());
        for candidate in &grouping.unassignable {
            out.push_str(&format!("\n  {} {}", style("unassigned").dim(), candidate.label()));
        }
        return out;
    };

    let width = column_width as usize;
    let gap = " ".repeat(constants.column_gap as usize);
    let (left, right) = if constants.border_width >= 2 { ("│", "│") } else { ("", "") };

    let cell = |text: &str| pad_str(text, width, Alignment::Left, Some("…")).into_owned();
    let join = |cells: Vec<String>| {
        cells
            .into_iter()
            .map(|c| format!("{}{}{}", left, c, right))
            .collect::<Vec<_>>()
            .join(&gap)
    };

    let headers = grouping
        .buckets
        .iter()
        .map(|bucket| {
            let name = pipeline
                .stage(&bucket.stage_id)
                .map(|s| s.name.as_str())
                .unwrap_or(bucket.stage_id.as_str());
            let text = cell(&format!("{} ({})", name, bucket.candidates.len()));
            style(text).bold().to_string()
        })
        .collect();
    let rule = grouping.buckets.iter().map(|_| "─".repeat(width)).collect();

    let mut lines = vec![join(headers), join(rule)];

    let depth = grouping
        .buckets
        .iter()
        .map(|b| b.candidates.len())
        .max()
        .unwrap_or(0);
    for row in 0..depth {
        let cells = grouping
            .buckets
            .iter()
            .map(|bucket| match bucket.candidates.get(row) {
                Some(candidate) => cell(candidate.label()),
                None => " ".repeat(width),
            })
            .collect();
        lines.push(join(cells));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Candidate, PipelineDraft, PipelineKind};
    use crate::grouping::group_candidates;
    use crate::layout::compute_column_layout;

    fn pipeline() -> Pipeline {
        Pipeline::from_draft(
            "p1",
            PipelineDraft {
                name: "Engineering".to_string(),
                description: String::new(),
                kind: PipelineKind::Candidate,
                stages: vec![Stage::new("s1", "Applied", 0), Stage::new("s2", "Offer", 1)],
                is_active: true,
                job_id: Some("job-1".to_string()),
            },
        )
    }

    #[test]
    fn test_render_board_columns() {
        console::set_colors_enabled(false);
        let pipeline = pipeline();
        let candidates = vec![
            Candidate::new("c1", "Ada Lovelace").with_application("job-1", Some("s1")),
            Candidate::new("c2", "Grace Hopper").with_application("job-1", Some("s1")),
        ];
        let grouping = group_candidates(&pipeline.stages, &candidates, "job-1");
        let constants = LayoutConstants::terminal();
        let layout = compute_column_layout(80, 2, &constants);

        let rendered = render_board(&pipeline, &grouping, &layout, &constants);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Applied (2)"));
        assert!(lines[0].contains("Offer (0)"));
        assert!(lines[3].contains("Grace Hopper"));
        assert_eq!(
            console::measure_text_width(lines[0]),
            console::measure_text_width(lines[2])
        );
    }

    #[test]
    fn test_render_empty_board_lists_unassignable() {
        console::set_colors_enabled(false);
        let mut pipeline = pipeline();
        pipeline.stages.clear();
        let candidates = vec![Candidate::new("c1", "Ada").with_application("job-1", None)];
        let grouping = group_candidates(&pipeline.stages, &candidates, "job-1");

        let rendered = render_board(
            &pipeline,
            &grouping,
            &ColumnLayout::Empty,
            &LayoutConstants::terminal(),
        );
        assert!(rendered.contains("has no stages"));
        assert!(rendered.contains("Ada"));
    }

    #[test]
    fn test_commit_failed_event_mentions_error() {
        console::set_colors_enabled(false);
        let line = format_drag_event(&DragEvent::CommitFailed {
            candidate_id: "c1".to_string(),
            stage_id: "s2".to_string(),
            error: "API error: 500".to_string(),
        });
        assert!(line.contains("c1"));
        assert!(line.contains("API error: 500"));
    }

    #[test]
    fn test_unknown_stage_warning_names_default_routing() {
        console::set_colors_enabled(false);
        let line = format_warning(&GroupingWarning::StageNotFound {
            candidate_id: "c2".to_string(),
            stage_id: "gone".to_string(),
        });
        assert!(line.contains("unknown stage gone"));
        assert!(line.contains("lowest-order stage"));
    }
}
