//! Character grid mirrored in host memory
//!
//! The grid holds one device glyph code per visible character cell, row-major
//! with index `row * columns + column`. A refresh cycle clears it, lets the
//! draw callback repopulate it, then pushes it to the device row by row.

use heapless::Vec;

use crate::charmap::GlyphTable;
use crate::{utf8, ConfigError};

/// Largest column count across the supported module family
pub const MAX_COLUMNS: u8 = 20;

/// Largest row count across the supported module family
pub const MAX_ROWS: u8 = 4;

/// Device glyph code the grid is cleared to
pub const BLANK_GLYPH: u8 = 0x20;

const MAX_POSITIONS: usize = MAX_COLUMNS as usize * MAX_ROWS as usize;

/// A `columns x rows` grid of device glyph codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    columns: u8,
    rows: u8,
    cells: Vec<u8, MAX_POSITIONS>,
}

impl Buffer {
    /// Allocate a grid; dimensions are fixed for the lifetime of the buffer
    pub fn new(columns: u8, rows: u8) -> Result<Self, ConfigError> {
        if columns == 0 || columns > MAX_COLUMNS || rows == 0 || rows > MAX_ROWS {
            return Err(ConfigError::InvalidDimensions);
        }
        let mut cells = Vec::new();
        // Capacity is MAX_COLUMNS * MAX_ROWS, cannot fail
        let _ = cells.resize(columns as usize * rows as usize, BLANK_GLYPH);
        Ok(Self {
            columns,
            rows,
            cells,
        })
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    /// Total number of character cells
    pub fn positions(&self) -> usize {
        self.cells.len()
    }

    /// Fill every cell with the blank glyph
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = BLANK_GLYPH);
    }

    /// Glyph code at `(column, row)`, if in range
    pub fn at(&self, column: u8, row: u8) -> Option<u8> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells
            .get(row as usize * self.columns as usize + column as usize)
            .copied()
    }

    /// The whole grid, row-major
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// One row of glyph codes, used for the row-by-row device refresh
    pub fn row(&self, row: u8) -> Option<&[u8]> {
        if row >= self.rows {
            return None;
        }
        let start = row as usize * self.columns as usize;
        Some(&self.cells[start..start + self.columns as usize])
    }

    /// Decode `text` as UTF-8 and write it into the grid starting at
    /// `(column, row)`.
    ///
    /// `\n` advances to column 0 of the next row regardless of the starting
    /// column. Writes past the end of the grid stop the operation; glyphs
    /// already placed stay put. A malformed sequence likewise aborts the
    /// remainder of the call.
    pub fn print_at(&mut self, column: u8, row: u8, text: &[u8], glyphs: &GlyphTable) {
        let columns = self.columns as usize;
        let mut pos = row as usize * columns + column as usize;
        let mut rest = text;

        while !rest.is_empty() {
            let (codepoint, consumed) = match utf8::decode(rest) {
                Ok(decoded) => decoded,
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("print aborted on malformed UTF-8: {}", _e);
                    return;
                }
            };
            rest = &rest[consumed..];

            if codepoint == u32::from(b'\n') {
                pos = (pos / columns + 1) * columns;
                continue;
            }

            if pos >= self.cells.len() {
                #[cfg(feature = "defmt")]
                defmt::warn!("print writing out of range, truncated");
                return;
            }

            self.cells[pos] = glyphs.resolve(codepoint);
            pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_20x4() -> (Buffer, GlyphTable) {
        (Buffer::new(20, 4).unwrap(), GlyphTable::new())
    }

    #[test]
    fn test_dimensions() {
        let buffer = Buffer::new(16, 2).unwrap();
        assert_eq!(buffer.columns(), 16);
        assert_eq!(buffer.rows(), 2);
        assert_eq!(buffer.positions(), 32);
        assert!(buffer.as_bytes().iter().all(|&c| c == BLANK_GLYPH));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert_eq!(Buffer::new(0, 4), Err(ConfigError::InvalidDimensions));
        assert_eq!(Buffer::new(20, 0), Err(ConfigError::InvalidDimensions));
        assert_eq!(Buffer::new(21, 4), Err(ConfigError::InvalidDimensions));
        assert_eq!(Buffer::new(20, 5), Err(ConfigError::InvalidDimensions));
    }

    #[test]
    fn test_print_ascii_sequential() {
        let (mut buffer, glyphs) = grid_20x4();
        buffer.print_at(3, 1, b"Hi!", &glyphs);
        assert_eq!(buffer.at(3, 1), Some(b'H'));
        assert_eq!(buffer.at(4, 1), Some(b'i'));
        assert_eq!(buffer.at(5, 1), Some(b'!'));
        assert_eq!(buffer.at(6, 1), Some(BLANK_GLYPH));
        // Linear positions match row * columns + column
        assert_eq!(buffer.as_bytes()[23], b'H');
    }

    #[test]
    fn test_newline_resets_to_column_zero() {
        let (mut buffer, glyphs) = grid_20x4();
        buffer.print_at(0, 0, b"Line1\nLine2", &glyphs);
        assert_eq!(&buffer.row(0).unwrap()[..5], b"Line1");
        assert_eq!(&buffer.row(1).unwrap()[..5], b"Line2");
        // Row 1 starts at linear index 20
        assert_eq!(buffer.as_bytes()[20], b'L');
    }

    #[test]
    fn test_newline_from_nonzero_column() {
        let (mut buffer, glyphs) = grid_20x4();
        buffer.print_at(7, 2, b"ab\ncd", &glyphs);
        assert_eq!(buffer.at(7, 2), Some(b'a'));
        assert_eq!(buffer.at(8, 2), Some(b'b'));
        // Newline goes to column 0 of row 3, not back to column 7
        assert_eq!(buffer.at(0, 3), Some(b'c'));
        assert_eq!(buffer.at(1, 3), Some(b'd'));
    }

    #[test]
    fn test_overflow_truncates() {
        let (mut buffer, glyphs) = grid_20x4();
        buffer.print_at(18, 3, b"abcdef", &glyphs);
        // Last two cells written, rest dropped without wrapping
        assert_eq!(buffer.at(18, 3), Some(b'a'));
        assert_eq!(buffer.at(19, 3), Some(b'b'));
        assert_eq!(buffer.at(0, 0), Some(BLANK_GLYPH));
    }

    #[test]
    fn test_write_at_last_position() {
        let (mut buffer, glyphs) = grid_20x4();
        buffer.print_at(19, 3, b"Z", &glyphs);
        assert_eq!(buffer.at(19, 3), Some(b'Z'));
    }

    #[test]
    fn test_write_past_last_position_rejected() {
        let (mut buffer, glyphs) = grid_20x4();
        // Start position == positions, nothing written
        buffer.print_at(0, 3, b"\n_", &glyphs);
        assert!(buffer.as_bytes().iter().all(|&c| c == BLANK_GLYPH));
    }

    #[test]
    fn test_decode_failure_aborts_remainder() {
        let (mut buffer, glyphs) = grid_20x4();
        buffer.print_at(0, 0, &[b'o', b'k', 0xFF, b'x'], &glyphs);
        // Glyphs before the bad byte stay, nothing after is written
        assert_eq!(buffer.at(0, 0), Some(b'o'));
        assert_eq!(buffer.at(1, 0), Some(b'k'));
        assert_eq!(buffer.at(2, 0), Some(BLANK_GLYPH));
        assert_eq!(buffer.at(3, 0), Some(BLANK_GLYPH));
    }

    #[test]
    fn test_unicode_resolved_through_glyph_table() {
        let (mut buffer, glyphs) = grid_20x4();
        buffer.print_at(0, 0, "23\u{00b0}C".as_bytes(), &glyphs);
        assert_eq!(buffer.at(0, 0), Some(b'2'));
        assert_eq!(buffer.at(1, 0), Some(b'3'));
        assert_eq!(buffer.at(2, 0), Some(0xDF)); // degree sign in device ROM
        assert_eq!(buffer.at(3, 0), Some(b'C'));
    }

    #[test]
    fn test_custom_glyph_in_text() {
        let (mut buffer, mut glyphs) = grid_20x4();
        glyphs.set(2, 0x2764, [0x0A, 0x1F, 0x1F, 0x0E, 0x04, 0, 0, 0]).unwrap();
        buffer.print_at(0, 0, "\u{2764}!".as_bytes(), &glyphs);
        assert_eq!(buffer.at(0, 0), Some(2));
        assert_eq!(buffer.at(1, 0), Some(b'!'));
    }

    #[test]
    fn test_clear_idempotent() {
        let (mut buffer, glyphs) = grid_20x4();
        buffer.print_at(0, 0, b"dirty", &glyphs);
        buffer.clear();
        let once = buffer.clone();
        buffer.clear();
        assert_eq!(buffer, once);
        assert!(buffer.as_bytes().iter().all(|&c| c == BLANK_GLYPH));
    }
}
