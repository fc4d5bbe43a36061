//! Stage domain model

use crate::core::error::PipelineError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A named, colored, ordered bucket that candidates occupy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Unique stage identifier
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Hex color (`#RRGGBB`)
    pub color: String,

    /// Icon identifier
    pub icon: String,

    /// Position within the pipeline, 1-based and contiguous
    pub order: u32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial stage update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl StagePatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Self::default()
        }
    }
}

/// Color/icon pairs assigned to new stages, cycled by stage count
pub const STAGE_PALETTE: [(&str, &str); 8] = [
    ("#3B82F6", "inbox"),
    ("#8B5CF6", "phone"),
    ("#F59E0B", "users"),
    ("#10B981", "clipboard-check"),
    ("#EC4899", "file-signature"),
    ("#22C55E", "badge-check"),
    ("#EF4444", "x-circle"),
    ("#6B7280", "archive"),
];

/// Palette entry for the stage at `index` (0-based)
pub fn palette_entry(index: usize) -> (&'static str, &'static str) {
    STAGE_PALETTE[index % STAGE_PALETTE.len()]
}

impl Stage {
    /// Create an active stage with palette defaults for position `index`
    pub fn new(id: impl Into<String>, name: impl Into<String>, index: usize) -> Self {
        let (color, icon) = palette_entry(index);
        Stage {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            color: color.to_string(),
            icon: icon.to_string(),
            order: index as u32 + 1,
            is_active: true,
        }
    }

    /// Whether the stage has a usable name
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Shallow-merge a patch; never touches `order`
    pub fn apply(&mut self, patch: &StagePatch) -> Result<(), PipelineError> {
        if let Some(color) = &patch.color {
            validate_color(color)?;
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(icon) = &patch.icon {
            self.icon = icon.clone();
        }
        Ok(())
    }
}

fn color_regex() -> Option<&'static Regex> {
    static COLOR: OnceLock<Option<Regex>> = OnceLock::new();
    COLOR
        .get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").ok())
        .as_ref()
}

/// Check a stage color is a `#RRGGBB` hex string
pub fn validate_color(color: &str) -> Result<(), PipelineError> {
    if color_regex().is_some_and(|re| re.is_match(color)) {
        Ok(())
    } else {
        Err(PipelineError::InvalidColor(color.to_string()))
    }
}

/// Rewrite `order` to 1..N following the current slice positions
pub fn renumber(stages: &mut [Stage]) {
    for (index, stage) in stages.iter_mut().enumerate() {
        stage.order = index as u32 + 1;
    }
}

/// Check the contiguous 1..N order invariant against slice positions
pub fn orders_contiguous(stages: &[Stage]) -> bool {
    let mut orders: Vec<u32> = stages.iter().map(|s| s.order).collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(index, order)| *order == index as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        assert_eq!(palette_entry(0), palette_entry(STAGE_PALETTE.len()));
        assert_ne!(palette_entry(0), palette_entry(1));
    }

    #[test]
    fn test_apply_patch_is_shallow() {
        let mut stage = Stage::new("s1", "Applied", 0);
        stage
            .apply(&StagePatch {
                name: Some("New".to_string()),
                icon: Some("star".to_string()),
                ..StagePatch::default()
            })
            .unwrap();

        assert_eq!(stage.name, "New");
        assert_eq!(stage.icon, "star");
        assert_eq!(stage.color, STAGE_PALETTE[0].0);
        assert_eq!(stage.order, 1);
    }

    #[test]
    fn test_apply_rejects_bad_color_without_partial_write() {
        let mut stage = Stage::new("s1", "Applied", 0);
        let patch = StagePatch {
            name: Some("Renamed".to_string()),
            color: Some("blue".to_string()),
            ..StagePatch::default()
        };

        assert!(matches!(stage.apply(&patch), Err(PipelineError::InvalidColor(_))));
        assert_eq!(stage.name, "Applied");
    }

    #[test]
    fn test_renumber_and_contiguity() {
        let mut stages = vec![
            Stage::new("a", "A", 4),
            Stage::new("b", "B", 0),
            Stage::new("c", "C", 9),
        ];
        assert!(!orders_contiguous(&stages));

        renumber(&mut stages);
        assert!(orders_contiguous(&stages));
        assert_eq!(stages.iter().map(|s| s.order).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
