//! A single display line and the cell-level diff used to repaint it.
//!
//! Repainting a character LCD line wholesale flickers, so every assignment
//! is compared against the previous content and only the cells that changed
//! are reported back to the caller for writing.

use crate::protocol::DISPLAY_COLUMNS;

/// Glyph assumed for any index past the end of a string.
pub const BLANK: char = ' ';

/// Last index examined by [`TextLine::diff`].
///
/// The scan covers one cell past the visible width. That cell only differs
/// when a value longer than [`DISPLAY_COLUMNS`] is assigned, in which case
/// the display receives a cursor move to column 21.
pub const LAST_DIFF_INDEX: usize = DISPLAY_COLUMNS;

/// One cell that must be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellUpdate {
    /// 0-based index into the line.
    pub index: usize,
    /// Character to draw at that index.
    pub glyph: char,
}

impl CellUpdate {
    /// 1-based column for the cursor command.
    ///
    /// Indices never exceed [`LAST_DIFF_INDEX`], so this always fits a byte.
    pub fn cursor_column(&self) -> u8 {
        (self.index + 1) as u8
    }
}

/// Current content of one display line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextLine {
    text: String,
}

impl TextLine {
    /// An empty line. Every cell compares as blank.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the content and return the cells that changed.
    ///
    /// Assigning the current value is a no-op and returns an empty vector.
    pub fn set(&mut self, value: impl Into<String>) -> Vec<CellUpdate> {
        let value = value.into();
        if value == self.text {
            return Vec::new();
        }
        let updates = Self::diff(&self.text, &value);
        self.text = value;
        updates
    }

    /// Cells in `0..=LAST_DIFF_INDEX` whose glyph differs between `old` and
    /// `new`, in ascending order. Missing characters compare as [`BLANK`].
    ///
    /// # Examples
    ///
    /// ```
    /// use lcd_core::text_line::TextLine;
    ///
    /// let cells = TextLine::diff("12:00", "12:01");
    /// assert_eq!(cells.len(), 1);
    /// assert_eq!(cells[0].index, 4);
    /// assert_eq!(cells[0].glyph, '1');
    /// ```
    pub fn diff(old: &str, new: &str) -> Vec<CellUpdate> {
        let mut old_chars = old.chars();
        let mut new_chars = new.chars();

        (0..=LAST_DIFF_INDEX)
            .filter_map(|index| {
                let before = old_chars.next().unwrap_or(BLANK);
                let after = new_chars.next().unwrap_or(BLANK);
                (before != after).then_some(CellUpdate { index, glyph: after })
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
