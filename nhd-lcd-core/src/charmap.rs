//! Unicode to device glyph code mapping
//!
//! The display ROM holds ASCII (with three Japanese-market substitutions),
//! a katakana block at 0xA1-0xDF and a handful of Greek letters, diacritics
//! and symbols at 0xE0-0xFF. On top of that the device has 8 slots of glyph
//! RAM for user-defined 5x8 bitmaps, addressed by codes 0x00-0x07.
//!
//! [`GlyphTable::resolve`] is a total function: every codepoint maps to some
//! 8-bit device code, with `'?'` as the fallback for anything the device
//! cannot render.

/// Number of user-definable glyph slots in device glyph RAM
pub const CUSTOM_SLOTS: usize = 8;

/// Device code printed for codepoints with no device glyph
pub const FALLBACK_GLYPH: u8 = b'?';

use crate::ConfigError;

/// One user-defined glyph resident in host memory
///
/// The device loses its glyph RAM on reset, so the controller keeps every
/// slot here and replays them during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GlyphSlot {
    /// Unicode scalar this slot renders, 0 = slot unused
    pub unicode: u32,
    /// One byte per pixel row of the 5x8 cell
    pub pixels: [u8; 8],
}

impl GlyphSlot {
    const UNUSED: Self = Self {
        unicode: 0,
        pixels: [0; 8],
    };

    /// Whether this slot holds a caller-defined glyph
    pub fn is_resident(&self) -> bool {
        self.unicode != 0
    }
}

/// The 8 custom glyph slots plus the static extended character map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphTable {
    slots: [GlyphSlot; CUSTOM_SLOTS],
    /// Slots changed since they were last loaded to the device, one bit each
    dirty: u8,
}

impl Default for GlyphTable {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphTable {
    /// Create a table with all slots unused
    pub fn new() -> Self {
        Self {
            slots: [GlyphSlot::UNUSED; CUSTOM_SLOTS],
            dirty: 0,
        }
    }

    /// Assign a custom glyph to `slot` and mark it for device upload
    pub fn set(&mut self, slot: u8, unicode: u32, pixels: [u8; 8]) -> Result<(), ConfigError> {
        if slot as usize >= CUSTOM_SLOTS {
            return Err(ConfigError::InvalidSlot);
        }
        self.slots[slot as usize] = GlyphSlot { unicode, pixels };
        self.dirty |= 1 << slot;
        Ok(())
    }

    /// Get a slot by index
    pub fn slot(&self, slot: u8) -> Option<&GlyphSlot> {
        self.slots.get(slot as usize)
    }

    /// Iterate over slots holding a caller-defined glyph
    pub fn resident(&self) -> impl Iterator<Item = (u8, &GlyphSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_resident())
            .map(|(i, s)| (i as u8, s))
    }

    /// Iterate over slots pending device upload
    pub fn dirty(&self) -> impl Iterator<Item = (u8, &GlyphSlot)> {
        let dirty = self.dirty;
        self.slots
            .iter()
            .enumerate()
            .filter(move |(i, _)| dirty & (1 << i) != 0)
            .map(|(i, s)| (i as u8, s))
    }

    /// Clear the pending-upload mark for one slot
    pub fn mark_loaded(&mut self, slot: u8) {
        if (slot as usize) < CUSTOM_SLOTS {
            self.dirty &= !(1 << slot);
        }
    }

    /// Clear the pending-upload mark for every slot
    pub fn mark_all_loaded(&mut self) {
        self.dirty = 0;
    }

    /// Map a Unicode scalar value to an 8-bit device glyph code.
    ///
    /// Total function, resolution order:
    /// 1. Codepoints up to 0x0F address glyph RAM / reserved codes directly.
    /// 2. A custom slot holding this codepoint wins, overriding the ROM.
    /// 3. The static extended character map.
    /// 4. 0x10-0x1F and 0x80-0x9F are blank regions on the device.
    /// 5. 0x20-0x7F passes through as ASCII. Backslash, tilde and DEL never
    ///    reach this step: the ROM shows yen / right arrow / left arrow at
    ///    those codes, so the map resolves them in step 3.
    /// 6. Anything else falls back to `'?'`.
    pub fn resolve(&self, codepoint: u32) -> u8 {
        if codepoint <= 0x0F {
            return codepoint as u8;
        }

        for (index, slot) in self.slots.iter().enumerate() {
            if slot.is_resident() && slot.unicode == codepoint {
                return index as u8;
            }
        }

        if let Some(code) = extended_lookup(codepoint) {
            return code;
        }

        if (0x10..=0x1F).contains(&codepoint) || (0x80..=0x9F).contains(&codepoint) {
            return FALLBACK_GLYPH;
        }

        if (0x20..=0x7F).contains(&codepoint) {
            return codepoint as u8;
        }

        FALLBACK_GLYPH
    }
}

fn extended_lookup(codepoint: u32) -> Option<u8> {
    EXTENDED_MAP
        .binary_search_by_key(&codepoint, |&(cp, _)| cp)
        .ok()
        .map(|i| EXTENDED_MAP[i].1)
}

/// Unicode to device ROM code, sorted by codepoint for binary search.
///
/// The first three entries cover the ASCII codes the ROM repurposes:
/// backslash, tilde and DEL have no glyph (the ROM shows yen, right arrow
/// and left arrow there), so they render as the fallback glyph while the
/// substituted characters map onto those codes.
static EXTENDED_MAP: &[(u32, u8)] = &[
    (0x005C, FALLBACK_GLYPH), // backslash, ROM shows yen here
    (0x007E, FALLBACK_GLYPH), // tilde, ROM shows right arrow here
    (0x007F, FALLBACK_GLYPH), // DEL, ROM shows left arrow here
    (0x00A2, 0xEC),           // cent sign
    (0x00A3, 0xED),           // pound sign
    (0x00A5, 0x5C),           // yen sign
    (0x00B0, 0xDF),           // degree sign
    (0x00B7, 0xA5),           // middle dot
    (0x00E4, 0xE1),           // a with diaeresis
    (0x00F1, 0xEE),           // n with tilde
    (0x00F6, 0xEF),           // o with diaeresis
    (0x00F7, 0xFD),           // division sign
    (0x00FC, 0xF5),           // u with diaeresis
    (0x03A3, 0xF6),           // capital sigma
    (0x03A9, 0xF4),           // capital omega
    (0x03B1, 0xE0),           // alpha
    (0x03B2, 0xE2),           // beta
    (0x03B5, 0xE3),           // epsilon
    (0x03B8, 0xF2),           // theta
    (0x03BC, 0xE4),           // mu
    (0x03C0, 0xF7),           // pi
    (0x03C1, 0xE6),           // rho
    (0x03C3, 0xE5),           // sigma
    (0x2190, 0x7F),           // left arrow
    (0x2192, 0x7E),           // right arrow
    (0x221A, 0xE8),           // square root
    (0x221E, 0xF3),           // infinity
    (0x2588, 0xFF),           // full block
    (0x3001, 0xA4),           // ideographic comma
    (0x3002, 0xA1),           // ideographic full stop
    (0x300C, 0xA2),           // left corner bracket
    (0x300D, 0xA3),           // right corner bracket
    (0x309B, 0xDE),           // voiced sound mark
    (0x309C, 0xDF),           // semi-voiced sound mark
    (0x30A1, 0xA7),           // small a
    (0x30A2, 0xB1),           // katakana a
    (0x30A3, 0xA8),           // small i
    (0x30A4, 0xB2),           // katakana i
    (0x30A5, 0xA9),           // small u
    (0x30A6, 0xB3),           // katakana u
    (0x30A7, 0xAA),           // small e
    (0x30A8, 0xB4),           // katakana e
    (0x30A9, 0xAB),           // small o
    (0x30AA, 0xB5),           // katakana o
    (0x30AB, 0xB6),           // ka
    (0x30AD, 0xB7),           // ki
    (0x30AF, 0xB8),           // ku
    (0x30B1, 0xB9),           // ke
    (0x30B3, 0xBA),           // ko
    (0x30B5, 0xBB),           // sa
    (0x30B7, 0xBC),           // si
    (0x30B9, 0xBD),           // su
    (0x30BB, 0xBE),           // se
    (0x30BD, 0xBF),           // so
    (0x30BF, 0xC0),           // ta
    (0x30C1, 0xC1),           // ti
    (0x30C3, 0xAF),           // small tu
    (0x30C4, 0xC2),           // tu
    (0x30C6, 0xC3),           // te
    (0x30C8, 0xC4),           // to
    (0x30CA, 0xC5),           // na
    (0x30CB, 0xC6),           // ni
    (0x30CC, 0xC7),           // nu
    (0x30CD, 0xC8),           // ne
    (0x30CE, 0xC9),           // no
    (0x30CF, 0xCA),           // ha
    (0x30D2, 0xCB),           // hi
    (0x30D5, 0xCC),           // hu
    (0x30D8, 0xCD),           // he
    (0x30DB, 0xCE),           // ho
    (0x30DE, 0xCF),           // ma
    (0x30DF, 0xD0),           // mi
    (0x30E0, 0xD1),           // mu
    (0x30E1, 0xD2),           // me
    (0x30E2, 0xD3),           // mo
    (0x30E3, 0xAC),           // small ya
    (0x30E4, 0xD4),           // ya
    (0x30E5, 0xAD),           // small yu
    (0x30E6, 0xD5),           // yu
    (0x30E7, 0xAE),           // small yo
    (0x30E8, 0xD6),           // yo
    (0x30E9, 0xD7),           // ra
    (0x30EA, 0xD8),           // ri
    (0x30EB, 0xD9),           // ru
    (0x30EC, 0xDA),           // re
    (0x30ED, 0xDB),           // ro
    (0x30EF, 0xDC),           // wa
    (0x30F2, 0xA6),           // wo
    (0x30F3, 0xDD),           // n
    (0x30FB, 0xA5),           // katakana middle dot
    (0x30FC, 0xB0),           // prolonged sound mark
];

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_map_is_sorted() {
        for pair in EXTENDED_MAP.windows(2) {
            assert!(pair[0].0 < pair[1].0, "map not sorted at {:#X}", pair[1].0);
        }
    }

    #[test]
    fn test_direct_region() {
        let table = GlyphTable::new();
        for cp in 0..=0x0F {
            assert_eq!(table.resolve(cp), cp as u8);
        }
    }

    #[test]
    fn test_ascii_passthrough() {
        let table = GlyphTable::new();
        assert_eq!(table.resolve(u32::from(b' ')), b' ');
        assert_eq!(table.resolve(u32::from(b'A')), b'A');
        assert_eq!(table.resolve(u32::from(b'z')), b'z');
        assert_eq!(table.resolve(u32::from(b'0')), b'0');
    }

    #[test]
    fn test_rom_substituted_ascii() {
        let table = GlyphTable::new();
        // No backslash/tilde/DEL glyphs in the ROM
        assert_eq!(table.resolve(0x5C), FALLBACK_GLYPH);
        assert_eq!(table.resolve(0x7E), FALLBACK_GLYPH);
        assert_eq!(table.resolve(0x7F), FALLBACK_GLYPH);
        // The substituted characters land on the repurposed codes
        assert_eq!(table.resolve(0x00A5), 0x5C); // yen
        assert_eq!(table.resolve(0x2192), 0x7E); // right arrow
        assert_eq!(table.resolve(0x2190), 0x7F); // left arrow
    }

    #[test]
    fn test_extended_map() {
        let table = GlyphTable::new();
        assert_eq!(table.resolve(0x00B0), 0xDF); // degree
        assert_eq!(table.resolve(0x03C0), 0xF7); // pi
        assert_eq!(table.resolve(0x30A2), 0xB1); // katakana a
        assert_eq!(table.resolve(0x2588), 0xFF); // full block
    }

    #[test]
    fn test_blank_regions() {
        let table = GlyphTable::new();
        assert_eq!(table.resolve(0x10), FALLBACK_GLYPH);
        assert_eq!(table.resolve(0x1F), FALLBACK_GLYPH);
        assert_eq!(table.resolve(0x80), FALLBACK_GLYPH);
        assert_eq!(table.resolve(0x9F), FALLBACK_GLYPH);
    }

    #[test]
    fn test_unknown_falls_back() {
        let table = GlyphTable::new();
        assert_eq!(table.resolve(0x00E9), FALLBACK_GLYPH); // e acute, not in ROM
        assert_eq!(table.resolve(0x1F600), FALLBACK_GLYPH); // emoji
        assert_eq!(table.resolve(u32::MAX), FALLBACK_GLYPH);
    }

    #[test]
    fn test_custom_slot_overrides_map() {
        let mut table = GlyphTable::new();
        // Degree sign normally resolves through the extended map
        assert_eq!(table.resolve(0x00B0), 0xDF);
        table.set(3, 0x00B0, [0x06, 0x09, 0x09, 0x06, 0, 0, 0, 0]).unwrap();
        assert_eq!(table.resolve(0x00B0), 3);
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut table = GlyphTable::new();
        assert_eq!(table.set(8, 0x2764, [0; 8]), Err(ConfigError::InvalidSlot));
        assert_eq!(table.resident().count(), 0);
    }

    #[test]
    fn test_dirty_tracking() {
        let mut table = GlyphTable::new();
        table.set(0, 0x2764, [1; 8]).unwrap();
        table.set(5, 0x2665, [2; 8]).unwrap();

        let pending: heapless::Vec<u8, 8> = table.dirty().map(|(i, _)| i).collect();
        assert_eq!(pending.as_slice(), &[0, 5]);

        table.mark_loaded(0);
        let pending: heapless::Vec<u8, 8> = table.dirty().map(|(i, _)| i).collect();
        assert_eq!(pending.as_slice(), &[5]);

        table.mark_all_loaded();
        assert_eq!(table.dirty().count(), 0);
        // Still resident, just loaded
        assert_eq!(table.resident().count(), 2);
    }

    proptest! {
        // resolve() is total: any u32 yields some 8-bit code
        #[test]
        fn prop_resolve_total(cp in any::<u32>()) {
            let mut table = GlyphTable::new();
            let _ = table.resolve(cp);
            table.set(2, 0x2764, [0x0A, 0x1F, 0x1F, 0x0E, 0x04, 0, 0, 0]).unwrap();
            let _ = table.resolve(cp);
        }

        // A resident slot always wins for its own codepoint
        #[test]
        fn prop_slot_priority(cp in 1u32.., slot in 0u8..8) {
            prop_assume!(cp > 0x0F);
            let mut table = GlyphTable::new();
            table.set(slot, cp, [0; 8]).unwrap();
            prop_assert_eq!(table.resolve(cp), slot);
        }
    }
}
