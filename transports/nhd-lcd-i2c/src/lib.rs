//! I2C transport for Newhaven serial character LCDs
//!
//! Each frame (command or raw data) goes out as one I2C write transaction to
//! the module's 7-bit address. The factory default address is 0x28.

#![no_std]
#![deny(unsafe_code)]

use embedded_hal::i2c::I2c;
use nhd_lcd_core::{Transport, COMMAND_PREFIX, MAX_COMMAND_PARAMS};

/// Factory default 7-bit address of the module
pub const DEFAULT_ADDRESS: u8 = 0x28;

/// Adapter framing display traffic into I2C write transactions
pub struct I2cTransport<I> {
    i2c: I,
    address: u8,
}

impl<I> I2cTransport<I> {
    /// Use the factory default address
    pub fn new(i2c: I) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Use a custom address (after a `change_i2c_address`)
    pub fn with_address(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Take the bus back
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> Transport for I2cTransport<I> {
    type Error = I::Error;

    fn write_raw(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address, data)
    }

    fn write_command(&mut self, opcode: u8, params: &[u8]) -> Result<(), Self::Error> {
        let mut frame = [0u8; 2 + MAX_COMMAND_PARAMS];
        let len = params.len().min(MAX_COMMAND_PARAMS);
        frame[0] = COMMAND_PREFIX;
        frame[1] = opcode;
        frame[2..2 + len].copy_from_slice(&params[..len]);
        self.i2c.write(self.address, &frame[..2 + len])
    }
}
