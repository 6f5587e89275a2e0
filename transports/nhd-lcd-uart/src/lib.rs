//! UART transport for Newhaven serial character LCDs
//!
//! RS-232 is a plain byte stream, so frames need no delimiting beyond their
//! own prefix byte. The module ships at 9600 baud 8N1; after a
//! `change_rs232_baud_rate` command the host UART must be reconfigured to
//! match, which is the HAL's business.

#![no_std]
#![deny(unsafe_code)]

use embedded_io::Write;
use nhd_lcd_core::{Transport, COMMAND_PREFIX};

/// Adapter writing display traffic to a UART byte stream
pub struct UartTransport<U> {
    uart: U,
}

impl<U> UartTransport<U> {
    pub fn new(uart: U) -> Self {
        Self { uart }
    }

    /// Take the UART back
    pub fn release(self) -> U {
        self.uart
    }
}

impl<U: Write> Transport for UartTransport<U> {
    type Error = U::Error;

    fn write_raw(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.uart.write_all(data)
    }

    fn write_command(&mut self, opcode: u8, params: &[u8]) -> Result<(), Self::Error> {
        self.uart.write_all(&[COMMAND_PREFIX, opcode])?;
        self.uart.write_all(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_io::ErrorType;
    use heapless::Vec;

    #[derive(Default)]
    struct MockUart {
        bytes: Vec<u8, 64>,
    }

    impl ErrorType for MockUart {
        type Error = Infallible;
    }

    impl Write for MockUart {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
            self.bytes.extend_from_slice(buf).unwrap();
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    #[test]
    fn test_command_byte_sequence() {
        let mut transport = UartTransport::new(MockUart::default());
        transport.write_command(0x53, &[8]).unwrap();

        let uart = transport.release();
        assert_eq!(uart.bytes.as_slice(), &[0xFE, 0x53, 8]);
    }

    #[test]
    fn test_raw_then_command_preserves_order() {
        let mut transport = UartTransport::new(MockUart::default());
        transport.write_raw(b"ab").unwrap();
        transport.write_command(0x46, &[]).unwrap();

        let uart = transport.release();
        assert_eq!(uart.bytes.as_slice(), &[b'a', b'b', 0xFE, 0x46]);
    }
}
