//! SPI transport for Newhaven serial character LCDs
//!
//! Each frame goes out as one chip-select-framed [`SpiDevice`] transaction,
//! so command prefix, opcode and parameters stay together on the wire. The
//! module wants MSB-first, mode 3, and tops out around 100 kHz; bus
//! configuration is the HAL's business, not this adapter's.

#![no_std]
#![deny(unsafe_code)]

use embedded_hal::spi::SpiDevice;
use nhd_lcd_core::{Transport, COMMAND_PREFIX, MAX_COMMAND_PARAMS};

/// Adapter framing display traffic into SPI transactions
pub struct SpiTransport<S> {
    spi: S,
}

impl<S> SpiTransport<S> {
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    /// Take the bus device back
    pub fn release(self) -> S {
        self.spi
    }
}

impl<S: SpiDevice> Transport for SpiTransport<S> {
    type Error = S::Error;

    fn write_raw(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(data)
    }

    fn write_command(&mut self, opcode: u8, params: &[u8]) -> Result<(), Self::Error> {
        let mut frame = [0u8; 2 + MAX_COMMAND_PARAMS];
        let len = params.len().min(MAX_COMMAND_PARAMS);
        frame[0] = COMMAND_PREFIX;
        frame[1] = opcode;
        frame[2..2 + len].copy_from_slice(&params[..len]);
        self.spi.write(&frame[..2 + len])
    }
}
