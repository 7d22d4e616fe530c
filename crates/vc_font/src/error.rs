use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use vc_visit::VisitError;

// -----------------------------------------------------------------------------
// SheetError

/// A glyph sheet breaks one of its lookup or bounds invariants.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SheetError {
    #[error("Glyph table is not sorted by character code at index {0}")]
    UnsortedGlyphs(usize),

    #[error("Kerning table is not sorted by character pair at index {0}")]
    UnsortedKerning(usize),

    #[error("Pixels of glyph {code:#X} end at byte {end}, past the {len}-byte pixel blob")]
    PixelsOutOfBounds { code: u32, end: usize, len: usize },

    #[error("Pixel blob of {actual} bytes does not match its declared size of {declared}")]
    PixelCount { declared: u32, actual: usize },
}

// -----------------------------------------------------------------------------
// ResourceError

/// A byte stream is not a usable raster font resource.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResourceError {
    #[error("Stream does not start with a valid serialization header")]
    InvalidHeader(#[source] VisitError),

    #[error("Stream was serialized with an incompatible version")]
    IncompatibleVersion,

    #[error("Stream was serialized with an incompatible byte order")]
    IncompatibleByteOrder,

    #[error("Stream is not a raster font")]
    NotRasterFont(#[source] VisitError),

    #[error("Raster font version {major}.{minor} is not supported")]
    IncompatibleFontVersion { major: u16, minor: u16 },

    #[error("Glyph sheet is malformed: {0}")]
    InvalidSheet(#[from] SheetError),

    #[error("Unable to read the glyph sheet: {0}")]
    Visit(#[from] VisitError),
}

// -----------------------------------------------------------------------------
// FontError

/// A raster font file could not be loaded or saved.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FontError {
    #[error("Unable to open file {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("Unable to create file {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("Unable to write file {}: {source}", .path.display())]
    Write { path: PathBuf, source: VisitError },

    #[error("File {} is not a usable raster font: {source}", .path.display())]
    Resource {
        path: PathBuf,
        source: ResourceError,
    },
}

impl FontError {
    /// The file the failed operation was working on.
    pub fn path(&self) -> &Path {
        match self {
            Self::Open { path, .. }
            | Self::Create { path, .. }
            | Self::Write { path, .. }
            | Self::Resource { path, .. } => path,
        }
    }
}
