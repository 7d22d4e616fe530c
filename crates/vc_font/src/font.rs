use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use vc_visit::backend::{SliceReader, StreamReader, StreamWriter, VecWriter};
use vc_visit::{
    Deserializer, FormatError, ReadBuffer, SerializationHeader, Serializer, VisitError,
    WriteBuffer,
};

use crate::error::{FontError, ResourceError};
use crate::glyph::Glyph;
use crate::header::RasterFontHeader;
use crate::sheet::GlyphSheet;
use crate::surface::{GrayBuffer, Rect};

// -----------------------------------------------------------------------------
// RasterFont

/// A loaded raster font: a [`GlyphSheet`] plus text measuring and drawing.
///
/// On disk a font is a [`SerializationHeader`], a [`RasterFontHeader`]
/// and the glyph sheet, back to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RasterFont {
    sheet: GlyphSheet,
}

impl RasterFont {
    /// Extension appended to paths that have none.
    pub const DEFAULT_EXTENSION: &'static str = "rasterfont";

    #[inline]
    pub const fn new(sheet: GlyphSheet) -> Self {
        Self { sheet }
    }

    #[inline]
    pub const fn sheet(&self) -> &GlyphSheet {
        &self.sheet
    }

    #[inline]
    pub fn into_sheet(self) -> GlyphSheet {
        self.sheet
    }

    #[inline]
    pub const fn line_spacing(&self) -> u32 {
        self.sheet.line_spacing()
    }

    /// `path`, with [`DEFAULT_EXTENSION`](Self::DEFAULT_EXTENSION) added if
    /// it has no extension.
    pub fn resolve_path(path: &Path) -> PathBuf {
        match path.extension() {
            Some(_) => path.to_path_buf(),
            None => path.with_extension(Self::DEFAULT_EXTENSION),
        }
    }

    // -------------------------------------------------------------------------
    // Loading

    /// Reads and validates a font file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = Self::resolve_path(path.as_ref());
        let file = File::open(&path).map_err(|source| FontError::Open {
            path: path.clone(),
            source,
        })?;
        let font = Self::from_reader(BufReader::new(file)).map_err(|source| {
            FontError::Resource {
                path: path.clone(),
                source,
            }
        })?;

        log::debug!(
            "loaded raster font {} with {} glyphs",
            path.display(),
            font.sheet.glyph_count()
        );
        Ok(font)
    }

    /// Reads and validates a font from a stream.
    pub fn from_reader(reader: impl io::Read) -> Result<Self, ResourceError> {
        Self::read_resource(&mut Deserializer::new(StreamReader::new(reader)))
    }

    /// Reads and validates a font from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ResourceError> {
        Self::read_resource(&mut Deserializer::new(SliceReader::new(bytes)))
    }

    fn read_resource<B: ReadBuffer>(
        deserializer: &mut Deserializer<B>,
    ) -> Result<Self, ResourceError> {
        let mut header = SerializationHeader::new();
        deserializer
            .deserialize(&mut header)
            .map_err(|err| match err {
                VisitError::Io(_) => ResourceError::Visit(err),
                other => ResourceError::InvalidHeader(other),
            })?;
        if !header.is_current_version() {
            return Err(ResourceError::IncompatibleVersion);
        }
        if !header.is_host_endian() {
            return Err(ResourceError::IncompatibleByteOrder);
        }

        let mut font_header = RasterFontHeader::new();
        match deserializer.deserialize(&mut font_header) {
            Ok(()) => {}
            Err(VisitError::Format(FormatError::VersionMismatch { .. })) => {
                return Err(ResourceError::IncompatibleFontVersion {
                    major: font_header.major_version(),
                    minor: font_header.minor_version(),
                });
            }
            Err(err @ VisitError::Io(_)) => return Err(ResourceError::Visit(err)),
            Err(err) => return Err(ResourceError::NotRasterFont(err)),
        }

        let mut sheet = GlyphSheet::default();
        deserializer.deserialize(&mut sheet)?;
        sheet.validate()?;
        if sheet.default_glyph().is_none() {
            log::warn!("raster font has no default glyph; unknown characters will be skipped");
        }
        Ok(Self { sheet })
    }

    // -------------------------------------------------------------------------
    // Saving

    /// Appends the complete resource to `serializer`.
    pub fn serialize_into<B: WriteBuffer>(
        &self,
        serializer: &mut Serializer<B>,
    ) -> Result<(), VisitError> {
        serializer.serialize(&SerializationHeader::new())?;
        serializer.serialize(&RasterFontHeader::new())?;
        serializer.serialize(&self.sheet)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, VisitError> {
        let mut serializer = Serializer::new(VecWriter::new());
        self.serialize_into(&mut serializer)?;
        Ok(serializer.into_inner().into_inner())
    }

    /// Writes the resource to `writer`, returning the number of bytes written.
    pub fn write_to(&self, writer: impl io::Write) -> Result<usize, VisitError> {
        let mut serializer = Serializer::new(StreamWriter::new(writer));
        self.serialize_into(&mut serializer)?;
        let written = serializer.bytes_written();
        serializer.into_inner().into_inner()?;
        Ok(written)
    }

    /// Writes a font file and returns the path actually used.
    ///
    /// A partially written file is removed again.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<PathBuf, FontError> {
        let path = Self::resolve_path(path.as_ref());
        let file = File::create(&path).map_err(|source| FontError::Create {
            path: path.clone(),
            source,
        })?;

        let guard = RemoveOnFailure::new(&path);
        let written = self
            .write_to(BufWriter::new(file))
            .map_err(|source| FontError::Write {
                path: path.clone(),
                source,
            })?;
        guard.disarm();

        log::debug!("wrote raster font {} ({written} bytes)", path.display());
        Ok(path)
    }

    // -------------------------------------------------------------------------
    // Text

    /// Bounds of `text` relative to the pen origin on the first baseline.
    pub fn measure_string(&self, text: &str) -> Rect {
        let mut bounds = Rect::default();
        self.sheet
            .for_each_glyph(text, self.line_spacing(), |glyph, pen_x, pen_y| {
                bounds.include(glyph_box(glyph, to_i32(pen_x), to_i32(pen_y)));
            });
        bounds
    }

    /// Size of the glyph drawn for `character`, at the origin.
    pub fn measure_glyph(&self, character: char) -> Rect {
        self.sheet
            .find_glyph(u32::from(character))
            .map_or_else(Rect::default, |glyph| Rect {
                left: 0,
                top: 0,
                right: i32::from(glyph.width),
                bottom: i32::from(glyph.height),
            })
    }

    /// Draws `text` in white with its bounding box's top-left corner at `(x, y)`.
    #[inline]
    pub fn draw_string(&self, dest: &mut GrayBuffer<'_>, x: i32, y: i32, text: &str) {
        self.draw_string_shaded(dest, x, y, u8::MAX, text);
    }

    /// Draws `text` in `shade` with its bounding box's top-left corner at `(x, y)`.
    ///
    /// Only lit pixels are written.
    pub fn draw_string_shaded(
        &self,
        dest: &mut GrayBuffer<'_>,
        x: i32,
        y: i32,
        shade: u8,
        text: &str,
    ) {
        let baseline = -self.measure_string(text).top;
        self.sheet
            .for_each_glyph(text, self.line_spacing(), |glyph, pen_x, pen_y| {
                let bounds = glyph_box(glyph, to_i32(pen_x), to_i32(pen_y));
                let origin = (x + bounds.left, y + baseline + bounds.top);
                self.sheet.for_each_glyph_pixel(glyph, origin, |px, py, lit| {
                    if lit {
                        dest.set_pixel(px, py, shade);
                    }
                });
            });
    }

    /// Draws the glyph for `character` with its top-left corner at `(x, y)`.
    pub fn draw_glyph(&self, dest: &mut GrayBuffer<'_>, x: i32, y: i32, character: char, shade: u8) {
        let Some(glyph) = self.sheet.find_glyph(u32::from(character)) else {
            return;
        };
        self.sheet.for_each_glyph_pixel(glyph, (x, y), |px, py, lit| {
            if lit {
                dest.set_pixel(px, py, shade);
            }
        });
    }
}

impl From<GlyphSheet> for RasterFont {
    #[inline]
    fn from(sheet: GlyphSheet) -> Self {
        Self::new(sheet)
    }
}

#[inline]
fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Box of `glyph` drawn at pen position `(pen_x, pen_y)`.
fn glyph_box(glyph: &Glyph, pen_x: i32, pen_y: i32) -> Rect {
    let left = pen_x.saturating_add(i32::from(glyph.origin_x));
    let top = pen_y.saturating_sub(i32::from(glyph.origin_y));
    Rect {
        left,
        top,
        right: left.saturating_add(i32::from(glyph.width)),
        bottom: top.saturating_add(i32::from(glyph.height)),
    }
}

// -----------------------------------------------------------------------------
// RemoveOnFailure

/// Deletes a freshly created file when dropped, unless disarmed.
struct RemoveOnFailure<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> RemoveOnFailure<'a> {
    #[inline]
    fn new(path: &'a Path) -> Self {
        Self { path, armed: true }
    }

    #[inline]
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RemoveOnFailure<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::debug!("removing incomplete file {}", self.path.display());
            if let Err(err) = fs::remove_file(self.path) {
                log::warn!("unable to remove {}: {err}", self.path.display());
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use vc_visit::backend::{SliceReader, VecWriter};
    use vc_visit::{
        CapacityError, Deserializer, SerializationHeader, Serializer, VisitError,
        serialize_to_vec,
    };

    use super::{RasterFont, RemoveOnFailure};
    use crate::error::{FontError, ResourceError, SheetError};
    use crate::glyph::{Glyph, KerningPair};
    use crate::header::RasterFontHeader;
    use crate::sheet::GlyphSheet;
    use crate::surface::{GrayBuffer, Rect};

    fn glyph_a() -> Glyph {
        Glyph {
            code: 65,
            origin_x: 0,
            origin_y: 2,
            width: 3,
            height: 2,
            advance_x: 4,
            advance_y: 0,
            pixel_index: 0,
        }
    }

    fn font() -> RasterFont {
        let sheet = GlyphSheet::new(
            10,
            2,
            vec![glyph_a()],
            Vec::new(),
            vec![0b1011_1000],
            65,
        )
        .unwrap();
        RasterFont::new(sheet)
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vc_font_{}_{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Byte offsets of the three parts of an encoded font.
    fn offsets() -> (usize, usize) {
        let header = serialize_to_vec(&SerializationHeader::new()).unwrap().len();
        let font_header = serialize_to_vec(&RasterFontHeader::new()).unwrap().len();
        (header, header + font_header)
    }

    #[test]
    fn encoded_font_decodes_to_identical_tables() {
        let original = font();

        let mut serializer = Serializer::new(VecWriter::new());
        serializer.serialize(&SerializationHeader::new()).unwrap();
        serializer.serialize(&RasterFontHeader::new()).unwrap();
        serializer.serialize(original.sheet()).unwrap();
        let bytes = serializer.into_inner().into_inner();
        assert_eq!(bytes, original.to_bytes().unwrap());

        let mut deserializer = Deserializer::new(SliceReader::new(&bytes));
        let header: SerializationHeader = deserializer.deserialize_new().unwrap();
        let font_header: RasterFontHeader = deserializer.deserialize_new().unwrap();
        let sheet: GlyphSheet = deserializer.deserialize_new().unwrap();

        assert!(header.validate().is_ok());
        assert_eq!(font_header.name(), "Raster Font");
        assert_eq!(
            (font_header.major_version(), font_header.minor_version()),
            (0, 1)
        );
        assert_eq!(sheet.ascent(), 10);
        assert_eq!(sheet.descent(), 2);
        assert_eq!(sheet.glyphs(), original.sheet().glyphs());
        assert_eq!(sheet.pixels(), [0b1011_1000]);
        assert_eq!(sheet.default_glyph(), Some(&glyph_a()));
        assert_eq!(deserializer.buffer().rest(), &[] as &[u8]);

        assert_eq!(RasterFont::from_bytes(&bytes).unwrap(), original);
    }

    #[test]
    fn files_round_trip_with_default_extension() {
        let dir = scratch_dir("round_trip");
        let written = font().write_to_file(dir.join("small")).unwrap();
        assert_eq!(written, dir.join("small.rasterfont"));

        let loaded = RasterFont::load(dir.join("small")).unwrap();
        assert_eq!(loaded, font());

        let explicit = font().write_to_file(dir.join("small.bin")).unwrap();
        assert_eq!(explicit, dir.join("small.bin"));
        assert!(RasterFont::load(&explicit).is_ok());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_files_name_the_resolved_path() {
        let dir = scratch_dir("missing");
        let err = RasterFont::load(dir.join("absent")).unwrap_err();
        assert!(matches!(err, FontError::Open { .. }));
        assert_eq!(err.path(), dir.join("absent.rasterfont"));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn failed_writes_leave_no_file() {
        let dir = scratch_dir("guard");
        let path = dir.join("partial.rasterfont");
        fs::write(&path, b"partial").unwrap();
        drop(RemoveOnFailure::new(&path));
        assert!(!path.exists());

        fs::write(&path, b"complete").unwrap();
        RemoveOnFailure::new(&path).disarm();
        assert!(path.exists());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn corrupt_headers_are_classified() {
        let bytes = font().to_bytes().unwrap();
        let (header_end, font_header_end) = offsets();

        let patched = |offset: usize, patch: &[u8]| {
            let mut copy = bytes.clone();
            copy[offset..offset + patch.len()].copy_from_slice(patch);
            RasterFont::from_bytes(&copy).unwrap_err()
        };

        // Serialization header: label, version, byte-order mark.
        assert!(matches!(patched(8, b"X"), ResourceError::InvalidHeader(_)));
        let version_end = 8 + SerializationHeader::LABEL.len() + 8 + 4;
        assert!(matches!(
            patched(version_end - 1, b"2"),
            ResourceError::IncompatibleVersion
        ));
        assert!(matches!(
            patched(header_end - 2, &0xFFFEu16.to_ne_bytes()),
            ResourceError::IncompatibleByteOrder
        ));
        assert!(matches!(
            patched(header_end - 2, &0x0102u16.to_ne_bytes()),
            ResourceError::InvalidHeader(_)
        ));

        // Font header: name, then minor version.
        assert!(matches!(
            patched(header_end + 8, b"V"),
            ResourceError::NotRasterFont(_)
        ));
        assert!(matches!(
            patched(font_header_end - 2, &2u16.to_ne_bytes()),
            ResourceError::IncompatibleFontVersion { major: 0, minor: 2 }
        ));

        // Glyph sheet: the first glyph's pixel index.
        let pixel_index_at = font_header_end + 2 + 2 + 8 + 16;
        assert!(matches!(
            patched(pixel_index_at, &1000u32.to_ne_bytes()),
            ResourceError::InvalidSheet(SheetError::PixelsOutOfBounds { code: 65, .. })
        ));

        // Truncation inside the sheet.
        let err = RasterFont::from_bytes(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::Visit(VisitError::Capacity(CapacityError::Underflow { .. }))
        ));
    }

    #[test]
    fn corrupt_glyph_counts_fail_before_allocating() {
        let mut bytes = font().to_bytes().unwrap();
        let (_, font_header_end) = offsets();
        let count_at = font_header_end + 2 + 2;
        bytes[count_at..count_at + 8].copy_from_slice(&10_000_000u64.to_ne_bytes());

        let remaining = bytes.len() - (count_at + 8);
        let err = RasterFont::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::Visit(VisitError::Capacity(CapacityError::Underflow {
                required: 200_000_000,
                remaining: left,
            })) if left == remaining
        ));
    }

    #[test]
    fn loaded_tables_keep_lookup_order() {
        let sheet = GlyphSheet::new(
            1,
            1,
            vec![
                Glyph {
                    code: 'b' as u32,
                    ..Glyph::default()
                },
                Glyph {
                    code: 'a' as u32,
                    ..Glyph::default()
                },
            ],
            vec![
                KerningPair {
                    first: 2,
                    second: 1,
                    amount: 1,
                },
                KerningPair {
                    first: 1,
                    second: 2,
                    amount: 2,
                },
            ],
            Vec::new(),
            'a' as u32,
        )
        .unwrap();

        let loaded = RasterFont::from_reader(&font_bytes(&sheet)[..]).unwrap();
        let codes: Vec<u32> = loaded.sheet().glyphs().iter().map(|glyph| glyph.code).collect();
        assert_eq!(codes, ['a' as u32, 'b' as u32]);
        assert_eq!(loaded.sheet().find_kerning_pair(1, 2).unwrap().amount, 2);
        assert_eq!(loaded.sheet().find_glyph('z' as u32).unwrap().code, 'a' as u32);
    }

    fn font_bytes(sheet: &GlyphSheet) -> Vec<u8> {
        RasterFont::new(sheet.clone()).to_bytes().unwrap()
    }

    #[test]
    fn measuring_and_drawing() {
        let font = font();
        assert_eq!(
            font.measure_string("AA"),
            Rect {
                left: 0,
                top: -2,
                right: 7,
                bottom: 0
            }
        );
        assert_eq!(
            font.measure_glyph('A'),
            Rect {
                left: 0,
                top: 0,
                right: 3,
                bottom: 2
            }
        );

        let mut storage = [0u8; 5 * 3];
        let mut dest = GrayBuffer::new(&mut storage, 5, 3).unwrap();
        font.draw_glyph(&mut dest, 1, 1, 'A', 0x80);
        assert_eq!(
            storage,
            [
                0, 0, 0, 0, 0, //
                0, 0x80, 0, 0x80, 0, //
                0, 0x80, 0x80, 0, 0, //
            ]
        );

        let mut storage = [0u8; 4 * 2];
        let mut dest = GrayBuffer::new(&mut storage, 4, 2).unwrap();
        font.draw_string(&mut dest, 0, 0, "A");
        assert_eq!(storage, [0xFF, 0, 0xFF, 0, 0xFF, 0xFF, 0, 0]);
    }

    #[test]
    fn resolved_paths() {
        assert_eq!(
            RasterFont::resolve_path(Path::new("fonts/title")),
            Path::new("fonts/title.rasterfont")
        );
        assert_eq!(
            RasterFont::resolve_path(Path::new("fonts/title.bin")),
            Path::new("fonts/title.bin")
        );
    }
}
