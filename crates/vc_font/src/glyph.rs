use vc_visit::{Schema, Visit, lens};

/// Bytes needed to hold `bit_count` packed bits.
///
/// # Examples
///
/// ```
/// assert_eq!(vc_font::storage_size(0), 0);
/// assert_eq!(vc_font::storage_size(8), 1);
/// assert_eq!(vc_font::storage_size(9), 2);
/// ```
#[inline]
pub const fn storage_size(bit_count: usize) -> usize {
    bit_count.div_ceil(8)
}

// -----------------------------------------------------------------------------
// Glyph

/// Placement and pixel location of one character.
///
/// The box origin is relative to the pen position on the baseline, with
/// `origin_y` measured upwards. Pixels are 1 bit each, row-major and packed
/// MSB first, starting at byte `pixel_index` of the sheet's pixel blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Glyph {
    pub code: u32,
    pub origin_x: i16,
    pub origin_y: i16,
    pub width: u16,
    pub height: u16,
    /// Pen advance after the glyph.
    pub advance_x: u16,
    pub advance_y: u16,
    pub pixel_index: u32,
}

impl Glyph {
    /// Number of bytes the glyph's pixels occupy.
    #[inline]
    pub const fn pixel_bytes(&self) -> usize {
        storage_size(self.width as usize * self.height as usize)
    }

    /// The glyph's character, if `code` is a valid scalar value.
    #[inline]
    pub const fn character(&self) -> Option<char> {
        char::from_u32(self.code)
    }

    #[inline]
    pub(crate) fn is_blank(&self) -> bool {
        self.width <= 1 && self.height <= 1
    }
}

impl Visit for Glyph {
    fn build_schema() -> Schema<Self> {
        Schema::new()
            .member("code", lens!(Glyph, code))
            .member("origin_x", lens!(Glyph, origin_x))
            .member("origin_y", lens!(Glyph, origin_y))
            .member("width", lens!(Glyph, width))
            .member("height", lens!(Glyph, height))
            .member("advance_x", lens!(Glyph, advance_x))
            .member("advance_y", lens!(Glyph, advance_y))
            .member("pixel_index", lens!(Glyph, pixel_index))
    }
}

// -----------------------------------------------------------------------------
// KerningPair

/// Extra horizontal advance between two adjacent characters.
///
/// Character codes are UTF-16 units; pairs involving characters outside
/// the basic multilingual plane cannot be kerned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KerningPair {
    pub first: u16,
    pub second: u16,
    pub amount: i32,
}

impl KerningPair {
    #[inline]
    pub(crate) const fn key(&self) -> (u16, u16) {
        (self.first, self.second)
    }
}

impl Visit for KerningPair {
    fn build_schema() -> Schema<Self> {
        Schema::new()
            .member("first", lens!(KerningPair, first))
            .member("second", lens!(KerningPair, second))
            .member("amount", lens!(KerningPair, amount))
    }
}

#[cfg(test)]
mod tests {
    use super::{Glyph, KerningPair};

    #[test]
    fn wire_sizes() {
        let glyph = Glyph {
            code: 'A' as u32,
            width: 5,
            height: 3,
            ..Glyph::default()
        };
        assert_eq!(vc_visit::serialize_to_vec(&glyph).unwrap().len(), 20);
        assert_eq!(glyph.pixel_bytes(), 2);
        assert_eq!(glyph.character(), Some('A'));

        let pair = KerningPair {
            first: 1,
            second: 2,
            amount: -3,
        };
        assert_eq!(vc_visit::serialize_to_vec(&pair).unwrap().len(), 8);
    }

    #[test]
    fn inspection_lists_fields() {
        let pair = KerningPair {
            first: 65,
            second: 86,
            amount: -2,
        };
        let json = serde_json::to_value(vc_visit::SchemaSerializer::new(&pair)).unwrap();
        assert_eq!(json, serde_json::json!({ "first": 65, "second": 86, "amount": -2 }));
    }
}
