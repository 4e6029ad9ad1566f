//! Core types for the LCD monitor.
//!
//! Holds the error taxonomy, settings, display wire protocol, the line diff
//! engine and the text shown on each display line.

pub mod error;
pub mod formatting;
pub mod models;
pub mod protocol;
pub mod settings;
pub mod text_line;

pub use error::{LcdError, Result};
