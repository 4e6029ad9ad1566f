//! Command encoding for the serial character LCD.
//!
//! Every command is a `0xFE` prefix followed by an opcode and its operands.
//! Plain bytes outside a command are drawn at the cursor position.

/// Number of visible character cells per line.
pub const DISPLAY_COLUMNS: usize = 20;

/// Baud rate the display ships configured for.
pub const DEFAULT_BAUD_RATE: u32 = 19_200;

/// Descriptor prefix identifying the display among attached serial devices.
pub const DEFAULT_VENDOR_PREFIX: &str = "Matrix Orbital";

const COMMAND_PREFIX: u8 = 0xFE;
const OP_CLEAR_SCREEN: u8 = 0x58;
const OP_POWER_ON: u8 = 0x42;
const OP_POWER_OFF: u8 = 0x46;
const OP_SET_CURSOR: u8 = 0x47;

/// Byte sent in place of glyphs the display cannot draw.
const REPLACEMENT_GLYPH: u8 = b'?';

// ── Row ───────────────────────────────────────────────────────────────────────

/// One of the two display lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Row {
    Top,
    Bottom,
}

impl Row {
    /// 1-based line number as the display expects it.
    pub fn number(self) -> u8 {
        match self {
            Row::Top => 1,
            Row::Bottom => 2,
        }
    }

    /// 0-based index, for addressing per-line state.
    pub fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

// ── Command ───────────────────────────────────────────────────────────────────

/// A display command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Blank every cell and home the cursor.
    ClearScreen,
    /// Turn the backlight on. A timeout of zero keeps it on indefinitely.
    PowerOn { timeout_minutes: u8 },
    /// Turn the backlight off.
    PowerOff,
    /// Move the cursor. `column` is 1-based.
    SetCursor { column: u8, row: Row },
}

impl Command {
    /// Encode the command into the bytes sent over the wire.
    ///
    /// # Examples
    ///
    /// ```
    /// use lcd_core::protocol::{Command, Row};
    ///
    /// assert_eq!(Command::ClearScreen.encode(), vec![0xFE, 0x58]);
    /// assert_eq!(
    ///     Command::SetCursor { column: 3, row: Row::Bottom }.encode(),
    ///     vec![0xFE, 0x47, 3, 2]
    /// );
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Command::ClearScreen => vec![COMMAND_PREFIX, OP_CLEAR_SCREEN],
            Command::PowerOn { timeout_minutes } => {
                vec![COMMAND_PREFIX, OP_POWER_ON, timeout_minutes]
            }
            Command::PowerOff => vec![COMMAND_PREFIX, OP_POWER_OFF],
            Command::SetCursor { column, row } => {
                vec![COMMAND_PREFIX, OP_SET_CURSOR, column, row.number()]
            }
        }
    }
}

/// Byte used to draw `c` on the display.
///
/// The display only understands single-byte ASCII; anything else is sent as `?`.
pub fn glyph_byte(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        REPLACEMENT_GLYPH
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
