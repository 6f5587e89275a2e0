//! Byte transport abstraction
//!
//! The controller core has no knowledge of which bus it rides on. A transport
//! must put the exact byte sequences on the wire: `[0xFE][opcode][params...]`
//! for command frames and the bare bytes for raw character data. How a frame
//! is delimited (I2C transaction, SPI chip select, nothing at all for UART)
//! is the adapter's business.

/// A write-only byte pipe to the display module
pub trait Transport {
    /// Bus-specific error type
    type Error;

    /// Write raw character data bytes
    fn write_raw(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Write one command frame: prefix, opcode, then `params`
    fn write_command(&mut self, opcode: u8, params: &[u8]) -> Result<(), Self::Error>;
}
