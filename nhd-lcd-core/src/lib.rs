//! Driver core for Newhaven Display serial character LCD modules
//!
//! These modules (NHD-0420D3Z and friends) are character-cell displays driven
//! over I2C, SPI or RS-232 with a shared command protocol: a `0xFE` prefix
//! byte, an opcode, optional parameter bytes, and a mandatory settle time
//! before the next command. This crate contains everything that is
//! independent of the physical bus:
//!
//! - [`buffer::Buffer`] - the row-major character grid mirrored in host memory
//! - [`utf8`] - minimal UTF-8 sequence decoding
//! - [`charmap::GlyphTable`] - Unicode to device code mapping, including the
//!   8 user-defined glyph slots and the built-in extended character ROM
//! - [`command`] - the command table with opcodes and settle times
//! - [`driver::NhdLcd`] - the display controller and its state machine
//!
//! The physical bus is abstracted by [`transport::Transport`]; thin adapters
//! for I2C, SPI and UART live in their own crates so the controller has no
//! knowledge of which bus it rides on.
//!
//! # Example
//!
//! ```ignore
//! let mut lcd = NhdLcd::new(transport, delay, 20, 4, |canvas: &mut Canvas| {
//!     canvas.print_at(0, 0, "temp: 23\u{00b0}C");
//! })?;
//! lcd.setup(uptime_ms)?;
//! loop {
//!     lcd.update()?; // clear, draw callback, push grid to the device
//! }
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod buffer;
pub mod charmap;
pub mod command;
pub mod driver;
pub mod transport;
pub mod utf8;

pub use buffer::{Buffer, BLANK_GLYPH, MAX_COLUMNS, MAX_ROWS};
pub use charmap::{GlyphSlot, GlyphTable, CUSTOM_SLOTS, FALLBACK_GLYPH};
pub use command::{Command, COMMAND_PREFIX, MAX_COMMAND_PARAMS};
pub use driver::{Canvas, DriverError, DriverState, NhdLcd};
pub use transport::Transport;
pub use utf8::Utf8Error;

/// Errors raised when configuring the driver or its glyph slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Grid dimensions are zero or exceed the device maximum (20x4)
    InvalidDimensions,
    /// Custom glyph slot index is outside 0-7
    InvalidSlot,
}
