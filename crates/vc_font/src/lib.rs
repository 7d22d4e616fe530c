//! Bitmap fonts stored as persisted resources.
//!
//! A [`RasterFont`] owns a [`GlyphSheet`]: sorted glyph and kerning tables
//! plus one packed 1-bit pixel blob. Fonts are saved and loaded through
//! `vc_visit`, framed by a [`SerializationHeader`](vc_visit::SerializationHeader)
//! and a [`RasterFontHeader`].
//!
//! # Examples
//!
//! ```
//! use vc_font::{Glyph, GlyphSheet, GrayBuffer, RasterFont};
//!
//! let glyph = Glyph {
//!     code: 'I' as u32,
//!     origin_y: 2,
//!     width: 1,
//!     height: 2,
//!     advance_x: 2,
//!     ..Glyph::default()
//! };
//! let sheet = GlyphSheet::new(2, 0, vec![glyph], vec![], vec![0b1100_0000], 'I' as u32).unwrap();
//! let font = RasterFont::new(sheet);
//!
//! let bytes = font.to_bytes().unwrap();
//! let font = RasterFont::from_bytes(&bytes).unwrap();
//!
//! let mut pixels = [0u8; 4];
//! let mut dest = GrayBuffer::new(&mut pixels, 2, 2).unwrap();
//! font.draw_string(&mut dest, 0, 0, "I");
//! assert_eq!(pixels, [0xFF, 0, 0xFF, 0]);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod font;
mod glyph;
mod header;
mod sheet;
mod surface;

pub use error::{FontError, ResourceError, SheetError};
pub use font::RasterFont;
pub use glyph::{Glyph, KerningPair, storage_size};
pub use header::RasterFontHeader;
pub use sheet::GlyphSheet;
pub use surface::{GrayBuffer, Rect};
