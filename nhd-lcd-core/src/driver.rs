//! Display controller
//!
//! [`NhdLcd`] owns the character grid, the glyph table and all device-level
//! state (backlight, contrast, cursor mode) and drives the module through a
//! [`Transport`]. It follows the state machine
//! `Uninitialized -> Initializing -> Ready -> Failed`: a transport failure is
//! terminal until [`NhdLcd::setup`] is called again, since the device side
//! may be desynchronized and the glyph RAM content is unknown after a reset.
//!
//! The controller is single-threaded and polling-driven: the host scheduler
//! calls [`NhdLcd::update`] on its refresh interval, and every device-facing
//! call blocks for the transport round-trip plus the command's settle time.

use core::fmt;
use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use heapless::String;

use crate::buffer::{Buffer, MAX_COLUMNS};
use crate::charmap::{GlyphTable, CUSTOM_SLOTS};
use crate::command::{self, Command};
use crate::transport::Transport;
use crate::ConfigError;

/// The device ignores commands in its first 100 ms after power-up
const POWER_UP_QUIET_MS: u32 = 100;

/// Wait after each raw character data frame
const DATA_SETTLE_US: u32 = 100;

/// Wait after a full grid refresh
const REFRESH_SETTLE_US: u32 = 1000;

const DEFAULT_CONTRAST: u8 = 40;
const DEFAULT_BACKLIGHT: u8 = 8;

/// Bound on one formatted print, matching the device-side line discipline
const FORMAT_BUFFER: usize = 255;

/// Controller lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverState {
    /// Constructed, no command issued yet
    Uninitialized,
    /// Bringing the device to a known state
    Initializing,
    /// Device initialized, refresh cycles valid
    Ready,
    /// A transport write failed; terminal until re-setup
    Failed,
}

/// Errors surfaced by controller operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError<E> {
    /// The transport reported a write failure; the controller is now failed
    Transport(E),
    /// Operation not valid in the current state
    NotReady,
    /// Parameter outside its valid domain, nothing was sent
    InvalidParam,
}

/// The drawing surface handed to the draw callback
///
/// Holds the character grid and the glyph table. Everything here mutates
/// host memory only; the device sees the result when the controller pushes
/// the grid at the end of the refresh cycle.
pub struct Canvas {
    buffer: Buffer,
    glyphs: GlyphTable,
}

impl Canvas {
    fn new(columns: u8, rows: u8) -> Result<Self, ConfigError> {
        Ok(Self {
            buffer: Buffer::new(columns, rows)?,
            glyphs: GlyphTable::new(),
        })
    }

    /// Print at column 0, row 0
    pub fn print(&mut self, text: &str) {
        self.print_at(0, 0, text);
    }

    /// Print starting at `(column, row)`; see [`Buffer::print_at`]
    pub fn print_at(&mut self, column: u8, row: u8, text: &str) {
        self.buffer.print_at(column, row, text.as_bytes(), &self.glyphs);
    }

    /// Render format arguments (at most 255 bytes) and print at `(column, row)`
    pub fn print_fmt_at(&mut self, column: u8, row: u8, args: fmt::Arguments<'_>) {
        let mut rendered: String<FORMAT_BUFFER> = String::new();
        // Overflow keeps what fit; the grid truncates anyway
        let _ = rendered.write_fmt(args);
        self.print_at(column, row, &rendered);
    }

    /// Render format arguments and print at column 0, row 0
    pub fn print_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.print_fmt_at(0, 0, args);
    }

    /// Fill the grid with the blank glyph
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Define a custom glyph in the host slot table.
    ///
    /// The controller uploads it to the device at the end of the current
    /// refresh cycle (or during the next setup).
    pub fn set_custom_character(
        &mut self,
        slot: u8,
        unicode: u32,
        pixels: [u8; 8],
    ) -> Result<(), ConfigError> {
        self.glyphs.set(slot, unicode, pixels)
    }

    /// The character grid
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The glyph table
    pub fn glyphs(&self) -> &GlyphTable {
        &self.glyphs
    }
}

/// Display controller for Newhaven serial character LCD modules
///
/// `W` is the draw callback invoked once per [`update`](Self::update) to
/// repopulate the cleared grid.
pub struct NhdLcd<T, D, W> {
    transport: T,
    delay: D,
    writer: W,
    canvas: Canvas,
    state: DriverState,
    backlight: u8,
    contrast: u8,
    underline_cursor: bool,
    blinking_cursor: bool,
}

impl<T, D, W> NhdLcd<T, D, W>
where
    T: Transport,
    D: DelayNs,
    W: FnMut(&mut Canvas),
{
    /// Create a controller for a `columns x rows` module.
    ///
    /// Dimensions are immutable afterwards; at most 20x4 is supported.
    pub fn new(
        transport: T,
        delay: D,
        columns: u8,
        rows: u8,
        writer: W,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            transport,
            delay,
            writer,
            canvas: Canvas::new(columns, rows)?,
            state: DriverState::Uninitialized,
            backlight: DEFAULT_BACKLIGHT,
            contrast: DEFAULT_CONTRAST,
            underline_cursor: false,
            blinking_cursor: false,
        })
    }

    /// Bring the device to a known state.
    ///
    /// `uptime_ms` is the time since device power-up as observed by the
    /// caller; if the mandatory 100 ms quiet period has not elapsed yet the
    /// remainder is slept before the first command. Resident custom glyphs
    /// are replayed to the device glyph RAM, which is empty after any reset.
    ///
    /// Calling this again on a failed controller is the re-initialization
    /// path after a communication failure or device power cycle.
    pub fn setup(&mut self, uptime_ms: u32) -> Result<(), DriverError<T::Error>> {
        self.state = DriverState::Initializing;

        if uptime_ms < POWER_UP_QUIET_MS {
            self.delay.delay_ms(POWER_UP_QUIET_MS - uptime_ms);
        }

        self.command(command::DISPLAY_ON, &[])?;
        self.load_resident_glyphs()?;
        self.command(command::CLEAR_SCREEN, &[])?;
        self.command(command::SET_CONTRAST, &[self.contrast])?;
        self.command(command::SET_BACKLIGHT_BRIGHTNESS, &[self.backlight])?;
        self.underline_cursor_off()?;

        self.state = DriverState::Ready;
        Ok(())
    }

    /// One refresh cycle: clear the grid, run the draw callback, upload any
    /// glyph slots it defined, then push the grid to the device.
    pub fn update(&mut self) -> Result<(), DriverError<T::Error>> {
        if self.state != DriverState::Ready {
            return Err(DriverError::NotReady);
        }
        self.canvas.clear();
        (self.writer)(&mut self.canvas);
        self.flush_dirty_glyphs()?;
        self.display()
    }

    /// Push the current grid content to the device.
    ///
    /// Each row is addressed with a set-cursor command and sent as one raw
    /// data frame. This keeps the device address counter in lock-step with
    /// the grid's row model even if something moved the cursor in between.
    pub fn display(&mut self) -> Result<(), DriverError<T::Error>> {
        let width = self.canvas.buffer.columns() as usize;
        for row in 0..self.canvas.buffer.rows() {
            let mut line = [0u8; MAX_COLUMNS as usize];
            if let Some(source) = self.canvas.buffer.row(row) {
                line[..width].copy_from_slice(source);
            }
            self.command(command::SET_CURSOR, &[command::cursor_position(0, row)])?;
            self.send_data(&line[..width])?;
        }
        self.delay.delay_us(REFRESH_SETTLE_US);
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Whether the controller hit a terminal communication failure
    pub fn is_failed(&self) -> bool {
        self.state == DriverState::Failed
    }

    /// The drawing surface, for direct caller prints between refreshes
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Print at column 0, row 0
    pub fn print(&mut self, text: &str) {
        self.canvas.print(text);
    }

    /// Print starting at `(column, row)`
    pub fn print_at(&mut self, column: u8, row: u8, text: &str) {
        self.canvas.print_at(column, row, text);
    }

    /// Render format arguments and print at `(column, row)`
    pub fn print_fmt_at(&mut self, column: u8, row: u8, args: fmt::Arguments<'_>) {
        self.canvas.print_fmt_at(column, row, args);
    }

    /// Render format arguments and print at column 0, row 0
    pub fn print_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.canvas.print_fmt(args);
    }

    /// Fill the grid with the blank glyph
    pub fn clear(&mut self) {
        self.canvas.clear();
    }

    /// Define a custom glyph.
    ///
    /// The host slot table is always updated; if the controller is ready the
    /// slot is additionally loaded to the device right away so following
    /// prints referencing it render correctly.
    pub fn set_custom_character(
        &mut self,
        slot: u8,
        unicode: u32,
        pixels: [u8; 8],
    ) -> Result<(), DriverError<T::Error>> {
        if self.state == DriverState::Failed {
            return Err(DriverError::NotReady);
        }
        self.canvas
            .glyphs
            .set(slot, unicode, pixels)
            .map_err(|_| DriverError::InvalidParam)?;
        if self.state == DriverState::Ready {
            self.load_custom_character(slot)?;
            self.canvas.glyphs.mark_loaded(slot);
        }
        Ok(())
    }

    pub fn display_on(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::DISPLAY_ON, &[])
    }

    pub fn display_off(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::DISPLAY_OFF, &[])
    }

    /// Move the device write cursor to `(column, row)`, zero-based
    pub fn set_cursor(&mut self, column: u8, row: u8) -> Result<(), DriverError<T::Error>> {
        if column >= self.canvas.buffer.columns() || row >= self.canvas.buffer.rows() {
            return Err(DriverError::InvalidParam);
        }
        self.command(command::SET_CURSOR, &[command::cursor_position(column, row)])
    }

    pub fn cursor_home(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::CURSOR_HOME, &[])
    }

    pub fn underline_cursor_on(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::UNDERLINE_CURSOR_ON, &[])?;
        self.underline_cursor = true;
        Ok(())
    }

    pub fn underline_cursor_off(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::UNDERLINE_CURSOR_OFF, &[])?;
        self.underline_cursor = false;
        Ok(())
    }

    pub fn blinking_cursor_on(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::BLINKING_CURSOR_ON, &[])?;
        self.blinking_cursor = true;
        Ok(())
    }

    pub fn blinking_cursor_off(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::BLINKING_CURSOR_OFF, &[])?;
        self.blinking_cursor = false;
        Ok(())
    }

    pub fn move_cursor_left(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::MOVE_CURSOR_LEFT, &[])
    }

    pub fn move_cursor_right(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::MOVE_CURSOR_RIGHT, &[])
    }

    pub fn backspace(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::BACKSPACE, &[])
    }

    /// Clear the device screen directly (the host grid is untouched)
    pub fn clear_screen(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::CLEAR_SCREEN, &[])
    }

    /// Set contrast, valid range 1-50
    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), DriverError<T::Error>> {
        if !(1..=50).contains(&contrast) {
            return Err(DriverError::InvalidParam);
        }
        self.contrast = contrast;
        self.command(command::SET_CONTRAST, &[contrast])
    }

    /// Set backlight brightness, valid range 1-8 where 1 is off
    pub fn set_backlight(&mut self, value: u8) -> Result<(), DriverError<T::Error>> {
        if !(1..=8).contains(&value) {
            return Err(DriverError::InvalidParam);
        }
        self.backlight = value;
        self.command(command::SET_BACKLIGHT_BRIGHTNESS, &[value])
    }

    /// Restore the stored backlight brightness
    pub fn backlight_on(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::SET_BACKLIGHT_BRIGHTNESS, &[self.backlight])
    }

    /// Turn the backlight off without forgetting the stored brightness
    pub fn backlight_off(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::SET_BACKLIGHT_BRIGHTNESS, &[1])
    }

    pub fn move_display_left(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::MOVE_DISPLAY_LEFT, &[])
    }

    pub fn move_display_right(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::MOVE_DISPLAY_RIGHT, &[])
    }

    /// Switch the module's RS-232 interface to one of its 8 fixed rates
    pub fn change_rs232_baud_rate(&mut self, baud_rate: u32) -> Result<(), DriverError<T::Error>> {
        let id = command::baud_rate_id(baud_rate).ok_or(DriverError::InvalidParam)?;
        self.command(command::CHANGE_RS232_BAUD_RATE, &[id])
    }

    /// Switch the RS-232 rate by device baud id (1-8)
    pub fn change_rs232_baud_rate_id(&mut self, id: u8) -> Result<(), DriverError<T::Error>> {
        if !(1..=8).contains(&id) {
            return Err(DriverError::InvalidParam);
        }
        self.command(command::CHANGE_RS232_BAUD_RATE, &[id])
    }

    /// Change the module's I2C address; the device accepts even addresses only
    pub fn change_i2c_address(&mut self, address: u8) -> Result<(), DriverError<T::Error>> {
        if address & 0x01 != 0 {
            return Err(DriverError::InvalidParam);
        }
        self.command(command::CHANGE_I2C_ADDRESS, &[address])
    }

    /// Show the module firmware version on the screen
    pub fn display_firmware_version(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::DISPLAY_FIRMWARE_VERSION, &[])
    }

    /// Show the current RS-232 baud rate on the screen
    pub fn display_rs232_baud_rate(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::DISPLAY_RS232_BAUD_RATE, &[])
    }

    /// Show the current I2C address on the screen
    pub fn display_i2c_address(&mut self) -> Result<(), DriverError<T::Error>> {
        self.command(command::DISPLAY_I2C_ADDRESS, &[])
    }

    /// Stored backlight brightness (1-8)
    pub fn backlight(&self) -> u8 {
        self.backlight
    }

    /// Stored contrast (1-50)
    pub fn contrast(&self) -> u8 {
        self.contrast
    }

    /// Whether the underline cursor is on
    pub fn underline_cursor(&self) -> bool {
        self.underline_cursor
    }

    /// Whether the blinking cursor is on
    pub fn blinking_cursor(&self) -> bool {
        self.blinking_cursor
    }

    /// Log dimensions and device state
    #[cfg(feature = "defmt")]
    pub fn log_config(&self) {
        defmt::info!(
            "Newhaven LCD: {}x{}, state {}, contrast {}, backlight {}",
            self.canvas.buffer.columns(),
            self.canvas.buffer.rows(),
            self.state,
            self.contrast,
            self.backlight
        );
    }

    /// Take the transport and delay back, consuming the controller
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    /// Frame a command, send it, then block for its settle time.
    ///
    /// On a transport failure nothing more is sent and the controller goes
    /// to `Failed`; there is no settle wait and no retry.
    fn command(&mut self, cmd: Command, params: &[u8]) -> Result<(), DriverError<T::Error>> {
        if self.state == DriverState::Failed {
            return Err(DriverError::NotReady);
        }
        if let Err(e) = self.transport.write_command(cmd.opcode, params) {
            self.fail();
            return Err(DriverError::Transport(e));
        }
        self.delay.delay_us(u32::from(cmd.settle_time_us));
        Ok(())
    }

    fn send_data(&mut self, data: &[u8]) -> Result<(), DriverError<T::Error>> {
        if self.state == DriverState::Failed {
            return Err(DriverError::NotReady);
        }
        if let Err(e) = self.transport.write_raw(data) {
            self.fail();
            return Err(DriverError::Transport(e));
        }
        self.delay.delay_us(DATA_SETTLE_US);
        Ok(())
    }

    fn fail(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::error!("communication with Newhaven LCD failed");
        self.state = DriverState::Failed;
    }

    /// Send the 9-byte glyph load frame for one slot
    fn load_custom_character(&mut self, slot: u8) -> Result<(), DriverError<T::Error>> {
        let pixels = match self.canvas.glyphs.slot(slot) {
            Some(entry) => entry.pixels,
            None => return Err(DriverError::InvalidParam),
        };
        let mut params = [0u8; 9];
        params[0] = slot;
        params[1..].copy_from_slice(&pixels);
        self.command(command::LOAD_CUSTOM_CHARACTER, &params)
    }

    /// Replay every resident slot; device glyph RAM is empty after reset
    fn load_resident_glyphs(&mut self) -> Result<(), DriverError<T::Error>> {
        let mut pending = [0u8; CUSTOM_SLOTS];
        let mut count = 0;
        for (slot, _) in self.canvas.glyphs.resident() {
            pending[count] = slot;
            count += 1;
        }
        for &slot in &pending[..count] {
            self.load_custom_character(slot)?;
        }
        self.canvas.glyphs.mark_all_loaded();
        Ok(())
    }

    /// Upload slots the draw callback defined during this refresh
    fn flush_dirty_glyphs(&mut self) -> Result<(), DriverError<T::Error>> {
        let mut pending = [0u8; CUSTOM_SLOTS];
        let mut count = 0;
        for (slot, _) in self.canvas.glyphs.dirty() {
            pending[count] = slot;
            count += 1;
        }
        for &slot in &pending[..count] {
            self.load_custom_character(slot)?;
            self.canvas.glyphs.mark_loaded(slot);
        }
        Ok(())
    }
}
