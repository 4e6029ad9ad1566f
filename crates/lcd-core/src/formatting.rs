use chrono::{NaiveDateTime, Timelike};

use crate::protocol::DISPLAY_COLUMNS;

/// Glyphs cycled at both ends of the clock line, one per second.
pub const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Spinner glyph shown during `second`.
///
/// # Examples
///
/// ```
/// use lcd_core::formatting::spinner_glyph;
///
/// assert_eq!(spinner_glyph(0), '|');
/// assert_eq!(spinner_glyph(5), '/');
/// assert_eq!(spinner_glyph(59), '\\');
/// ```
pub fn spinner_glyph(second: u32) -> char {
    SPINNER[(second % 4) as usize]
}

/// Top-line text: spinner, date and 12-hour time, spinner.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use lcd_core::formatting::clock_text;
///
/// let now = NaiveDate::from_ymd_opt(2024, 3, 5)
///     .unwrap()
///     .and_hms_opt(15, 4, 6)
///     .unwrap();
/// assert_eq!(clock_text(&now), "- 05 Mar  03:04 PM -");
/// ```
pub fn clock_text(now: &NaiveDateTime) -> String {
    let glyph = spinner_glyph(now.second());
    format!("{glyph} {} {glyph}", now.format("%d %b  %I:%M %p"))
}

/// Bottom-line text from the CPU and GPU temperature lists.
///
/// Only the first reading of each list is shown; an empty list reads as 0.
/// Both lists empty blanks the whole line.
///
/// # Examples
///
/// ```
/// use lcd_core::formatting::temperature_text;
///
/// assert_eq!(temperature_text(&[7], &[23]), " CPU: 07c  GPU: 23c ");
/// assert_eq!(temperature_text(&[], &[]), " ".repeat(20));
/// ```
pub fn temperature_text(cpu: &[i32], gpu: &[i32]) -> String {
    if cpu.is_empty() && gpu.is_empty() {
        return " ".repeat(DISPLAY_COLUMNS);
    }

    let cpu = cpu.first().copied().unwrap_or_default();
    let gpu = gpu.first().copied().unwrap_or_default();
    format!(" CPU: {cpu:02}c  GPU: {gpu:02}c ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
