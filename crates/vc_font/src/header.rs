use vc_visit::{
    ConstVisitor, FormatError, Schema, Visit, VisitError, Visitor, read_text, write_text,
};

/// Identifies a stream as a raster font and records its format version.
///
/// Writes always carry this build's [`NAME`](Self::NAME) and version. Reads
/// accept only an exact version match: any other major or minor version
/// fails with [`FormatError::VersionMismatch`], after both numbers have
/// been recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFontHeader {
    name: String,
    major: u16,
    minor: u16,
}

impl RasterFontHeader {
    pub const NAME: &'static str = "Raster Font";
    pub const CURRENT_MAJOR_VERSION: u16 = 0;
    pub const CURRENT_MINOR_VERSION: u16 = 1;

    pub fn new() -> Self {
        Self {
            name: String::from(Self::NAME),
            major: Self::CURRENT_MAJOR_VERSION,
            minor: Self::CURRENT_MINOR_VERSION,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn major_version(&self) -> u16 {
        self.major
    }

    #[inline]
    pub const fn minor_version(&self) -> u16 {
        self.minor
    }

    #[inline]
    pub fn is_valid_name(&self) -> bool {
        self.name == Self::NAME
    }

    #[inline]
    pub const fn is_compatible_version(&self) -> bool {
        self.major == Self::CURRENT_MAJOR_VERSION && self.minor == Self::CURRENT_MINOR_VERSION
    }

    fn write_name(_: &Self, visitor: &mut dyn ConstVisitor) -> Result<(), VisitError> {
        write_text(visitor, Self::NAME)
    }

    fn read_name(&mut self, visitor: &mut dyn Visitor) -> Result<(), VisitError> {
        read_text(visitor, &mut self.name)?;
        if !self.is_valid_name() {
            return Err(FormatError::LabelMismatch {
                expected: Self::NAME,
                found: self.name.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn set_major(&mut self, major: u16) -> Result<(), VisitError> {
        self.major = major;
        Ok(())
    }

    fn set_minor(&mut self, minor: u16) -> Result<(), VisitError> {
        self.minor = minor;
        if !self.is_compatible_version() {
            return Err(FormatError::VersionMismatch {
                expected: format!(
                    "{}.{}",
                    Self::CURRENT_MAJOR_VERSION,
                    Self::CURRENT_MINOR_VERSION
                ),
                found: format!("{}.{}", self.major, self.minor),
            }
            .into());
        }
        Ok(())
    }
}

impl Default for RasterFontHeader {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Visit for RasterFontHeader {
    fn build_schema() -> Schema<Self> {
        Schema::new()
            .direct("name", Self::write_name, Self::read_name)
            .getter_setter(
                "major_version",
                |_| Self::CURRENT_MAJOR_VERSION,
                Self::set_major,
            )
            .getter_setter(
                "minor_version",
                |_| Self::CURRENT_MINOR_VERSION,
                Self::set_minor,
            )
    }
}
