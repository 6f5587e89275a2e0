//! Command table for the Newhaven serial LCD protocol
//!
//! Every command frame on the wire is `[0xFE][opcode][params...]`. The device
//! needs a minimum settle time after each command before it accepts the next
//! one; issuing a command early is undefined behavior on real hardware, so
//! the settle time is part of the table, not a tuning knob.

/// Sentinel distinguishing command frames from raw character data
pub const COMMAND_PREFIX: u8 = 0xFE;

/// Largest parameter count of any command (custom glyph load: index + 8 rows)
pub const MAX_COMMAND_PARAMS: usize = 9;

/// One entry of the device command set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    /// Command byte following the prefix
    pub opcode: u8,
    /// Minimum wait after the frame before the next command, in microseconds
    pub settle_time_us: u16,
}

pub const DISPLAY_ON: Command = Command { opcode: 0x41, settle_time_us: 100 };
pub const DISPLAY_OFF: Command = Command { opcode: 0x42, settle_time_us: 100 };
pub const SET_CURSOR: Command = Command { opcode: 0x45, settle_time_us: 100 };
pub const CURSOR_HOME: Command = Command { opcode: 0x46, settle_time_us: 1500 };
pub const UNDERLINE_CURSOR_ON: Command = Command { opcode: 0x47, settle_time_us: 1500 };
pub const UNDERLINE_CURSOR_OFF: Command = Command { opcode: 0x48, settle_time_us: 1500 };
pub const MOVE_CURSOR_LEFT: Command = Command { opcode: 0x49, settle_time_us: 100 };
pub const MOVE_CURSOR_RIGHT: Command = Command { opcode: 0x4A, settle_time_us: 100 };
pub const BLINKING_CURSOR_ON: Command = Command { opcode: 0x4B, settle_time_us: 100 };
pub const BLINKING_CURSOR_OFF: Command = Command { opcode: 0x4C, settle_time_us: 100 };
pub const BACKSPACE: Command = Command { opcode: 0x4E, settle_time_us: 100 };
pub const CLEAR_SCREEN: Command = Command { opcode: 0x51, settle_time_us: 1500 };
pub const SET_CONTRAST: Command = Command { opcode: 0x52, settle_time_us: 500 };
pub const SET_BACKLIGHT_BRIGHTNESS: Command = Command { opcode: 0x53, settle_time_us: 100 };
pub const LOAD_CUSTOM_CHARACTER: Command = Command { opcode: 0x54, settle_time_us: 200 };
pub const MOVE_DISPLAY_LEFT: Command = Command { opcode: 0x55, settle_time_us: 100 };
pub const MOVE_DISPLAY_RIGHT: Command = Command { opcode: 0x56, settle_time_us: 100 };
pub const CHANGE_RS232_BAUD_RATE: Command = Command { opcode: 0x61, settle_time_us: 3000 };
pub const CHANGE_I2C_ADDRESS: Command = Command { opcode: 0x62, settle_time_us: 3000 };
pub const DISPLAY_FIRMWARE_VERSION: Command = Command { opcode: 0x70, settle_time_us: 4000 };
pub const DISPLAY_RS232_BAUD_RATE: Command = Command { opcode: 0x71, settle_time_us: 10000 };
pub const DISPLAY_I2C_ADDRESS: Command = Command { opcode: 0x72, settle_time_us: 4000 };

/// DDRAM address of column 0 for each row
///
/// Rows interleave in device memory: row 2 continues row 0, row 3 continues
/// row 1. Cursor addressing must go through this table, not a multiply.
pub const ROW_START: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Parameter byte for [`SET_CURSOR`], `row` must be below 4
pub fn cursor_position(column: u8, row: u8) -> u8 {
    ROW_START[row as usize] + column
}

/// RS-232 rates the module supports, index + 1 is the device baud id
pub const BAUD_RATES: [u32; 8] = [300, 1200, 2400, 9600, 14400, 19200, 57600, 115200];

/// Map a baud rate to the single-byte id [`CHANGE_RS232_BAUD_RATE`] takes
pub fn baud_rate_id(baud_rate: u32) -> Option<u8> {
    BAUD_RATES
        .iter()
        .position(|&rate| rate == baud_rate)
        .map(|index| index as u8 + 1)
}
