//! Layout engine - uniform column widths for the board
//!
//! The available width is always injected (see [`WidthProvider`]); the
//! computation itself is a pure function of width, stage count and
//! [`LayoutConstants`].

pub mod measurement;

pub use measurement::{FixedWidth, TerminalWidth, WidthProvider};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed layout constants, in pixels (or character cells for terminals)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConstants {
    pub min_column_width: u32,
    pub max_column_width: u32,
    /// Space between adjacent columns
    pub column_gap: u32,
    /// Border width of one column (both sides together)
    pub border_width: u32,
    /// Outer container padding (both sides together)
    pub container_padding: u32,
    /// Reserved for a vertical scrollbar
    pub scroll_buffer: u32,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            min_column_width: 280,
            max_column_width: 400,
            column_gap: 16,
            border_width: 2,
            container_padding: 32,
            scroll_buffer: 20,
        }
    }
}

impl LayoutConstants {
    /// Preset measured in terminal character cells
    pub fn terminal() -> Self {
        Self {
            min_column_width: 14,
            max_column_width: 32,
            column_gap: 1,
            border_width: 2,
            container_padding: 0,
            scroll_buffer: 0,
        }
    }

    pub fn with_bounds(mut self, min_column_width: u32, max_column_width: u32) -> Self {
        self.min_column_width = min_column_width;
        self.max_column_width = max_column_width;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_column_width == 0 {
            anyhow::bail!("min_column_width must be positive");
        }
        if self.min_column_width > self.max_column_width {
            anyhow::bail!(
                "min_column_width ({}) exceeds max_column_width ({})",
                self.min_column_width,
                self.max_column_width
            );
        }
        Ok(())
    }
}

/// What caused a layout recomputation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTrigger {
    /// The container was resized
    Resize,
    /// An adjacent panel finished a width transition
    PanelTransitionEnd,
    /// A stage was added or removed
    StageCountChanged,
}

/// Computed board layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum ColumnLayout {
    /// No stages, no columns
    Empty,
    /// Every column gets the same width
    Uniform {
        column_width: u32,
        columns: usize,
        /// Columns + gaps + borders
        content_width: u32,
        /// Content plus padding exceeds the container (horizontal scroll)
        overflows: bool,
    },
}

impl ColumnLayout {
    pub fn column_width(&self) -> Option<u32> {
        match self {
            ColumnLayout::Empty => None,
            ColumnLayout::Uniform { column_width, .. } => Some(*column_width),
        }
    }

    pub fn columns(&self) -> usize {
        match self {
            ColumnLayout::Empty => 0,
            ColumnLayout::Uniform { columns, .. } => *columns,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ColumnLayout::Empty)
    }
}

/// Compute the uniform column width for `stage_count` columns
pub fn compute_column_layout(
    container_width: u32,
    stage_count: usize,
    constants: &LayoutConstants,
) -> ColumnLayout {
    if stage_count == 0 {
        return ColumnLayout::Empty;
    }

    let count = stage_count as i64;
    let gap = i64::from(constants.column_gap);
    let border = i64::from(constants.border_width);
    let chrome = gap * (count - 1) + border * count;

    let available = i64::from(container_width)
        - i64::from(constants.container_padding)
        - chrome
        - i64::from(constants.scroll_buffer);
    let ideal = available.div_euclid(count);

    // max wins when the bounds are inverted
    let column_width = ideal
        .max(i64::from(constants.min_column_width))
        .min(i64::from(constants.max_column_width))
        .max(0);

    let content_width = column_width * count + chrome;
    let overflows =
        content_width + i64::from(constants.container_padding) > i64::from(container_width);

    ColumnLayout::Uniform {
        column_width: clamp_u32(column_width),
        columns: stage_count,
        content_width: clamp_u32(content_width),
        overflows,
    }
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Stateless layout engine bound to a set of constants
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine {
    constants: LayoutConstants,
}

impl LayoutEngine {
    pub fn new(constants: LayoutConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &LayoutConstants {
        &self.constants
    }

    /// Compute the layout for an explicit width
    pub fn compute(&self, container_width: u32, stage_count: usize) -> ColumnLayout {
        compute_column_layout(container_width, stage_count, &self.constants)
    }

    /// Recompute after `trigger`, reading the width from `provider`
    pub fn recompute(
        &self,
        trigger: LayoutTrigger,
        provider: &dyn WidthProvider,
        stage_count: usize,
    ) -> ColumnLayout {
        let width = provider.available_width();
        let layout = self.compute(width, stage_count);
        debug!(?trigger, width, stage_count, ?layout, "Recomputed column layout");
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_to_max_and_fits_container() {
        let constants = LayoutConstants::default().with_bounds(300, 400);
        let layout = compute_column_layout(1200, 3, &constants);

        let width = layout.column_width().unwrap();
        assert!(width <= 400);
        assert!(width >= 300);
        match layout {
            ColumnLayout::Uniform { content_width, overflows, .. } => {
                assert!(content_width <= 1200);
                assert!(!overflows);
            }
            ColumnLayout::Empty => panic!("expected columns"),
        }
    }

    #[test]
    fn test_formula() {
        // 1200 - 32 - 16*2 - 2*3 - 20 = 1110, / 3 = 370
        let layout = compute_column_layout(1200, 3, &LayoutConstants::default());
        assert_eq!(layout.column_width(), Some(370));
    }

    #[test]
    fn test_wide_container_caps_at_max() {
        let layout = compute_column_layout(4000, 2, &LayoutConstants::default());
        assert_eq!(layout.column_width(), Some(400));
    }

    #[test]
    fn test_narrow_container_floors_at_min_and_overflows() {
        let layout = compute_column_layout(600, 6, &LayoutConstants::default());
        assert_eq!(layout.column_width(), Some(280));
        assert!(matches!(layout, ColumnLayout::Uniform { overflows: true, .. }));
    }

    #[test]
    fn test_zero_width_does_not_underflow() {
        let layout = compute_column_layout(0, 4, &LayoutConstants::default());
        assert_eq!(layout.column_width(), Some(280));
    }

    #[test]
    fn test_zero_stages_is_empty() {
        let layout = compute_column_layout(1200, 0, &LayoutConstants::default());
        assert_eq!(layout, ColumnLayout::Empty);
        assert_eq!(layout.columns(), 0);
        assert_eq!(layout.column_width(), None);
    }

    #[test]
    fn test_recompute_reads_provider() {
        let engine = LayoutEngine::new(LayoutConstants::default());
        let narrow = engine.recompute(LayoutTrigger::PanelTransitionEnd, &FixedWidth(900), 3);
        let wide = engine.recompute(LayoutTrigger::Resize, &FixedWidth(1400), 3);
        assert!(narrow.column_width() < wide.column_width());
    }

    #[test]
    fn test_constants_validation() {
        assert!(LayoutConstants::default().validate().is_ok());
        assert!(LayoutConstants::default().with_bounds(500, 400).validate().is_err());
        assert!(LayoutConstants::default().with_bounds(0, 400).validate().is_err());
    }
}
