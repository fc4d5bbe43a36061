//! Width measurement providers

/// Source of the width available to the board
pub trait WidthProvider: Send + Sync {
    fn available_width(&self) -> u32;
}

/// A fixed, externally measured width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWidth(pub u32);

impl WidthProvider for FixedWidth {
    fn available_width(&self) -> u32 {
        self.0
    }
}

/// Current terminal width in character cells
#[derive(Debug, Clone, Copy)]
pub struct TerminalWidth {
    /// Used when stdout is not a terminal
    pub fallback: u32,
}

impl Default for TerminalWidth {
    fn default() -> Self {
        Self { fallback: 80 }
    }
}

impl WidthProvider for TerminalWidth {
    fn available_width(&self) -> u32 {
        term_size::dimensions_stdout()
            .map(|(w, _)| w as u32)
            .unwrap_or(self.fallback)
    }
}
