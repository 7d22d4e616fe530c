use vc_visit::{Schema, Visit, VisitError, lens};

use crate::error::SheetError;
use crate::glyph::{Glyph, KerningPair};

// -----------------------------------------------------------------------------
// GlyphSheet

/// The glyphs, kerning pairs and packed pixels of one raster font.
///
/// Glyphs are kept sorted by code and kerning pairs by `(first, second)`,
/// so both lookups are binary searches. Unknown characters resolve to the
/// default glyph, if one is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphSheet {
    ascent: u16,
    descent: u16,
    glyphs: Vec<Glyph>,
    kerns: Vec<KerningPair>,
    pixel_bytes: u32,
    pixels: Box<[u8]>,
    default_glyph: Option<usize>,
}

impl GlyphSheet {
    /// Builds a sheet, sorting both tables.
    ///
    /// `default_glyph` names the code used for missing characters; it is
    /// ignored if no glyph has that code.
    pub fn new(
        ascent: u16,
        descent: u16,
        glyphs: Vec<Glyph>,
        kerns: Vec<KerningPair>,
        pixels: impl Into<Box<[u8]>>,
        default_glyph: u32,
    ) -> Result<Self, SheetError> {
        let pixels = pixels.into();
        let pixel_bytes = u32::try_from(pixels.len()).map_err(|_| SheetError::PixelCount {
            declared: u32::MAX,
            actual: pixels.len(),
        })?;

        let mut sheet = Self {
            ascent,
            descent,
            glyphs,
            kerns,
            pixel_bytes,
            pixels,
            default_glyph: None,
        };
        sheet.sort_tables();
        sheet.set_default_glyph(default_glyph);
        sheet.validate()?;
        Ok(sheet)
    }

    /// Distance from the baseline to the top of the tallest glyph.
    #[inline]
    pub const fn ascent(&self) -> u16 {
        self.ascent
    }

    /// Distance from the baseline to the bottom of the lowest glyph.
    #[inline]
    pub const fn descent(&self) -> u16 {
        self.descent
    }

    /// Vertical distance between consecutive lines.
    #[inline]
    pub const fn line_spacing(&self) -> u32 {
        self.ascent as u32 + self.descent as u32
    }

    /// Glyphs in code order.
    #[inline]
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    #[inline]
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Kerning pairs in `(first, second)` order.
    #[inline]
    pub fn kerning_pairs(&self) -> &[KerningPair] {
        &self.kerns
    }

    /// The packed 1-bit pixel blob.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub const fn pixel_bytes(&self) -> u32 {
        self.pixel_bytes
    }

    #[inline]
    pub fn default_glyph(&self) -> Option<&Glyph> {
        self.default_glyph.and_then(|index| self.glyphs.get(index))
    }

    /// Makes the glyph with `code` the fallback for missing characters.
    ///
    /// Clears the fallback if no glyph has that code.
    pub fn set_default_glyph(&mut self, code: u32) {
        self.default_glyph = self.glyph_index(code);
    }

    fn glyph_index(&self, code: u32) -> Option<usize> {
        self.glyphs.binary_search_by_key(&code, |glyph| glyph.code).ok()
    }

    /// Looks up the glyph for `code`, falling back to the default glyph.
    pub fn find_glyph(&self, code: u32) -> Option<&Glyph> {
        match self.glyph_index(code) {
            Some(index) => Some(&self.glyphs[index]),
            None => self.default_glyph(),
        }
    }

    /// Looks up the kerning between two characters.
    pub fn find_kerning_pair(&self, first: u16, second: u16) -> Option<&KerningPair> {
        self.kerns
            .binary_search_by_key(&(first, second), KerningPair::key)
            .ok()
            .map(|index| &self.kerns[index])
    }

    /// Kerning amount between two characters, 0 if none is recorded.
    pub fn kerning(&self, first: char, second: char) -> i32 {
        let (Ok(first), Ok(second)) = (u16::try_from(first), u16::try_from(second)) else {
            return 0;
        };
        self.find_kerning_pair(first, second)
            .map_or(0, |pair| pair.amount)
    }

    fn sort_tables(&mut self) {
        let default_code = self.default_glyph().map(|glyph| glyph.code);
        self.glyphs.sort_by_key(|glyph| glyph.code);
        self.kerns.sort_by_key(KerningPair::key);
        if let Some(code) = default_code {
            self.set_default_glyph(code);
        }
    }

    /// Checks table order and that every glyph's pixels lie inside the blob.
    pub fn validate(&self) -> Result<(), SheetError> {
        if self.pixels.len() != self.pixel_bytes as usize {
            return Err(SheetError::PixelCount {
                declared: self.pixel_bytes,
                actual: self.pixels.len(),
            });
        }
        if let Some(index) = self.glyphs.windows(2).position(|pair| pair[0].code > pair[1].code) {
            return Err(SheetError::UnsortedGlyphs(index + 1));
        }
        if let Some(index) = self.kerns.windows(2).position(|pair| pair[0].key() > pair[1].key()) {
            return Err(SheetError::UnsortedKerning(index + 1));
        }
        for glyph in &self.glyphs {
            let end = glyph.pixel_index as usize + glyph.pixel_bytes();
            if end > self.pixels.len() {
                return Err(SheetError::PixelsOutOfBounds {
                    code: glyph.code,
                    end,
                    len: self.pixels.len(),
                });
            }
        }
        Ok(())
    }

    /// Calls `f(x, y, lit)` for every pixel of `glyph`'s box, row by row.
    ///
    /// Coordinates are offset by `origin`. A glyph whose pixels fall outside
    /// the blob yields nothing.
    pub fn for_each_glyph_pixel(
        &self,
        glyph: &Glyph,
        origin: (i32, i32),
        mut f: impl FnMut(i32, i32, bool),
    ) {
        let cols = usize::from(glyph.width);
        let rows = usize::from(glyph.height);
        let start = glyph.pixel_index as usize;
        let Some(bytes) = self.pixels.get(start..start + glyph.pixel_bytes()) else {
            log::debug!("pixels of glyph {:#X} are out of bounds", glyph.code);
            return;
        };

        for bit in 0..cols * rows {
            let lit = (bytes[bit / 8] >> (7 - bit % 8)) & 1 != 0;
            let (row, col) = (bit / cols, bit % cols);
            f(origin.0 + col as i32, origin.1 + row as i32, lit);
        }
    }

    /// Lays out `text`, calling `f(glyph, pen_x, pen_y)` for every glyph to
    /// draw.
    ///
    /// - `\r` is skipped and `\n` starts a new line `line_spacing` lower.
    /// - Whitespace glyphs no larger than one pixel advance the pen without
    ///   being reported.
    /// - The advance includes kerning with the next character and never
    ///   moves the pen left of 0.
    /// - Characters with no glyph and no default glyph are skipped.
    pub fn for_each_glyph(
        &self,
        text: &str,
        line_spacing: u32,
        mut f: impl FnMut(&Glyph, u32, u32),
    ) {
        let mut pen_x = 0u32;
        let mut pen_y = 0u32;
        let mut chars = text.chars().peekable();

        while let Some(character) = chars.next() {
            match character {
                '\r' => continue,
                '\n' => {
                    pen_x = 0;
                    pen_y = pen_y.saturating_add(line_spacing);
                }
                _ => {
                    let Some(glyph) = self.find_glyph(u32::from(character)) else {
                        continue;
                    };
                    if !character.is_whitespace() || !glyph.is_blank() {
                        f(glyph, pen_x, pen_y);
                    }

                    let mut x = i64::from(pen_x) + i64::from(glyph.advance_x);
                    if let Some(&next) = chars.peek() {
                        x += i64::from(self.kerning(character, next));
                    }
                    pen_x = u32::try_from(x.max(0)).unwrap_or(u32::MAX);
                    pen_y = pen_y.saturating_add(u32::from(glyph.advance_y));
                }
            }
        }
    }

    fn default_glyph_code(&self) -> u32 {
        self.default_glyph().map_or(0, |glyph| glyph.code)
    }

    fn restore_default_glyph(&mut self, code: u32) -> Result<(), VisitError> {
        self.set_default_glyph(code);
        Ok(())
    }

    fn restore_lookup_order(&mut self) -> Result<(), VisitError> {
        self.default_glyph = None;
        self.sort_tables();
        Ok(())
    }
}

impl Visit for GlyphSheet {
    fn build_schema() -> Schema<Self> {
        Schema::new()
            .member("ascent", lens!(GlyphSheet, ascent))
            .member("descent", lens!(GlyphSheet, descent))
            .sequence("glyphs", lens!(GlyphSheet, glyphs))
            .sequence("kerns", lens!(GlyphSheet, kerns))
            .counted("pixels", lens!(GlyphSheet, pixels), lens!(GlyphSheet, pixel_bytes))
            .on_read("sort_tables", Self::restore_lookup_order)
            .getter_setter(
                "default_glyph",
                Self::default_glyph_code,
                Self::restore_default_glyph,
            )
    }
}

// -----------------------------------------------------------------------------
// Tests
