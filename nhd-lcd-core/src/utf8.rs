//! Minimal UTF-8 sequence decoding
//!
//! The display deals in 8-bit device codes, so text input is decoded one
//! Unicode scalar at a time and mapped through the glyph table. Decoding only
//! pattern-matches the leading byte and checks continuation bytes for the
//! `10xxxxxx` shape; overlong encodings and surrogate values are not
//! rejected here because the glyph table maps anything unknown to a fallback
//! glyph anyway.

/// Errors from decoding a single UTF-8 sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Utf8Error {
    /// Leading byte matches no valid sequence length
    InvalidLeadByte,
    /// A continuation byte does not match `10xxxxxx`
    InvalidContinuation,
    /// Input ends in the middle of a sequence
    Truncated,
}

/// Decode one UTF-8 sequence from the start of `bytes`.
///
/// Returns the decoded codepoint and the number of bytes consumed (1-4).
/// On error nothing is consumed; the caller aborts the current print
/// operation rather than attempting to resynchronize.
pub fn decode(bytes: &[u8]) -> Result<(u32, usize), Utf8Error> {
    let first = *bytes.first().ok_or(Utf8Error::Truncated)?;

    let (len, mut codepoint) = match first {
        0x00..=0x7F => return Ok((u32::from(first), 1)),
        0xC0..=0xDF => (2, u32::from(first & 0x1F)),
        0xE0..=0xEF => (3, u32::from(first & 0x0F)),
        0xF0..=0xF7 => (4, u32::from(first & 0x07)),
        _ => return Err(Utf8Error::InvalidLeadByte),
    };

    if bytes.len() < len {
        return Err(Utf8Error::Truncated);
    }

    for &b in &bytes[1..len] {
        if b & 0xC0 != 0x80 {
            return Err(Utf8Error::InvalidContinuation);
        }
        codepoint = (codepoint << 6) | u32::from(b & 0x3F);
    }

    Ok((codepoint, len))
}
