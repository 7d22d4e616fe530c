//! The stream header written ahead of persisted resources.
//!
//! The header identifies the format, records the version that wrote it and
//! carries a byte-order mark so that streams from a host of the other
//! endianness are detected instead of misread.

use alloc::string::String;

use bitflags::bitflags;

use crate::element::Visit;
use crate::error::{FormatError, VisitError};
use crate::schema::{Schema, read_text, write_text};
use crate::visitor::{ConstVisitor, Visitor};

bitflags! {
    /// Facts established while reading a [`SerializationHeader`].
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct HeaderFlags: u8 {
        /// The stream was written with the host's byte order.
        const IS_HOST_ENDIAN = 1 << 0;
        /// The stream was written by this version of the format.
        const IS_CURRENT_VERSION = 1 << 1;
    }
}

/// Format identity, version and byte-order mark.
///
/// Writing always emits the compiled [`LABEL`](Self::LABEL),
/// [`CURRENT_VERSION`](Self::CURRENT_VERSION) and
/// [`BYTE_ORDER_MARK`](Self::BYTE_ORDER_MARK). Reading fails on a foreign
/// label and records the version and byte order in [`flags`](Self::flags);
/// call [`validate`](Self::validate) to reject streams that cannot be read.
///
/// # Examples
///
/// ```
/// use vc_visit::SerializationHeader;
///
/// let bytes = vc_visit::serialize_to_vec(&SerializationHeader::new()).unwrap();
/// let header: SerializationHeader = vc_visit::from_slice(&bytes).unwrap();
///
/// assert!(header.is_current_version());
/// assert!(header.is_host_endian());
/// assert!(header.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializationHeader {
    label: String,
    version: String,
    flags: HeaderFlags,
}

impl SerializationHeader {
    pub const LABEL: &'static str = "VC Serialization";
    pub const CURRENT_VERSION: &'static str = "v0.1";
    pub const BYTE_ORDER_MARK: u16 = 0xFEFF;
    /// [`BYTE_ORDER_MARK`](Self::BYTE_ORDER_MARK) as seen from the other byte order.
    pub const SWAPPED_BYTE_ORDER_MARK: u16 = 0xFFFE;

    /// The header this build writes.
    pub fn new() -> Self {
        Self {
            label: String::from(Self::LABEL),
            version: String::from(Self::CURRENT_VERSION),
            flags: HeaderFlags::all(),
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Version string found in the stream.
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[inline]
    pub const fn flags(&self) -> HeaderFlags {
        self.flags
    }

    #[inline]
    pub const fn check_flag(&self, flag: HeaderFlags) -> bool {
        self.flags.contains(flag)
    }

    #[inline]
    pub const fn is_host_endian(&self) -> bool {
        self.check_flag(HeaderFlags::IS_HOST_ENDIAN)
    }

    #[inline]
    pub const fn is_current_version(&self) -> bool {
        self.check_flag(HeaderFlags::IS_CURRENT_VERSION)
    }

    /// Rejects headers from another format version or byte order.
    pub fn validate(&self) -> Result<(), FormatError> {
        if !self.is_current_version() {
            return Err(FormatError::VersionMismatch {
                expected: String::from(Self::CURRENT_VERSION),
                found: self.version.clone(),
            });
        }
        if !self.is_host_endian() {
            return Err(FormatError::ByteOrderMark(Self::SWAPPED_BYTE_ORDER_MARK));
        }
        Ok(())
    }

    fn write_label(_: &Self, visitor: &mut dyn ConstVisitor) -> Result<(), VisitError> {
        write_text(visitor, Self::LABEL)
    }

    fn read_label(&mut self, visitor: &mut dyn Visitor) -> Result<(), VisitError> {
        read_text(visitor, &mut self.label)?;
        if self.label != Self::LABEL {
            return Err(FormatError::LabelMismatch {
                expected: Self::LABEL,
                found: self.label.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn write_version(_: &Self, visitor: &mut dyn ConstVisitor) -> Result<(), VisitError> {
        write_text(visitor, Self::CURRENT_VERSION)
    }

    fn read_version(&mut self, visitor: &mut dyn Visitor) -> Result<(), VisitError> {
        read_text(visitor, &mut self.version)?;
        let current = self.version == Self::CURRENT_VERSION;
        self.flags.set(HeaderFlags::IS_CURRENT_VERSION, current);
        Ok(())
    }

    fn set_byte_order_mark(&mut self, mark: u16) -> Result<(), VisitError> {
        match mark {
            Self::BYTE_ORDER_MARK => self.flags.insert(HeaderFlags::IS_HOST_ENDIAN),
            Self::SWAPPED_BYTE_ORDER_MARK => self.flags.remove(HeaderFlags::IS_HOST_ENDIAN),
            other => return Err(FormatError::ByteOrderMark(other).into()),
        }
        Ok(())
    }
}

impl Default for SerializationHeader {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Visit for SerializationHeader {
    fn build_schema() -> Schema<Self> {
        Schema::new()
            .direct("label", Self::write_label, Self::read_label)
            .direct("version", Self::write_version, Self::read_version)
            .getter_setter(
                "byte_order_mark",
                |_| Self::BYTE_ORDER_MARK,
                Self::set_byte_order_mark,
            )
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::{HeaderFlags, SerializationHeader};
    use crate::{FormatError, VisitError, from_slice, serialize_to_vec};

    fn encode(label: &str, version: &str, mark: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        for text in [label, version] {
            bytes.extend_from_slice(&(text.len() as u64).to_ne_bytes());
            bytes.extend_from_slice(text.as_bytes());
        }
        bytes.extend_from_slice(&mark.to_ne_bytes());
        bytes
    }

    #[test]
    fn writes_compiled_constants() {
        let bytes = serialize_to_vec(&SerializationHeader::new()).unwrap();
        assert_eq!(bytes, encode("VC Serialization", "v0.1", 0xFEFF));
    }

    #[test]
    fn detects_swapped_byte_order() {
        let header: SerializationHeader =
            from_slice(&encode("VC Serialization", "v0.1", 0xFFFE)).unwrap();
        assert!(!header.is_host_endian());
        assert!(header.is_current_version());
        assert_eq!(
            header.validate(),
            Err(FormatError::ByteOrderMark(0xFFFE))
        );
    }

    #[test]
    fn rejects_garbage_byte_order() {
        let err = from_slice::<SerializationHeader>(&encode("VC Serialization", "v0.1", 0x1234))
            .unwrap_err();
        assert!(matches!(err, VisitError::Format(FormatError::ByteOrderMark(0x1234))));
    }

    #[test]
    fn records_other_versions() {
        let header: SerializationHeader =
            from_slice(&encode("VC Serialization", "v9.9", 0xFEFF)).unwrap();
        assert_eq!(header.flags(), HeaderFlags::IS_HOST_ENDIAN);
        assert_eq!(header.version(), "v9.9");
        assert_eq!(
            header.validate(),
            Err(FormatError::VersionMismatch {
                expected: String::from("v0.1"),
                found: String::from("v9.9"),
            })
        );

        // Re-encoding emits the current version again.
        let bytes = serialize_to_vec(&header).unwrap();
        assert_eq!(bytes, encode("VC Serialization", "v0.1", 0xFEFF));
    }

    #[test]
    fn rejects_foreign_labels() {
        let err = from_slice::<SerializationHeader>(&encode("PNG", "v0.1", 0xFEFF)).unwrap_err();
        assert!(matches!(
            err,
            VisitError::Format(FormatError::LabelMismatch { found, .. }) if found == "PNG"
        ));
    }
}
