use alloc::string::String;

use thiserror::Error;

// -----------------------------------------------------------------------------
// VisitError

/// Error raised while a schema is being visited.
///
/// The traversal engine never recovers from these: the first error aborts
/// the walk and is returned unchanged to the caller, whose destination
/// object is then in an unspecified state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VisitError {
    /// The encoded data does not describe a valid value.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A bounded buffer is too small for the data.
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    /// Storage for a decoded collection could not be allocated.
    #[error("Unable to allocate storage for {count} elements")]
    Allocation { count: usize },

    /// The underlying stream failed.
    #[error("Stream I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl VisitError {
    /// Returns `true` for [`VisitError::Format`].
    #[inline]
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Returns `true` for [`VisitError::Capacity`].
    #[inline]
    pub const fn is_capacity(&self) -> bool {
        matches!(self, Self::Capacity(_))
    }

    /// Returns `true` for [`VisitError::Allocation`].
    #[inline]
    pub const fn is_allocation(&self) -> bool {
        matches!(self, Self::Allocation { .. })
    }
}

// -----------------------------------------------------------------------------
// FormatError

/// The decoded bytes contradict the schema or a header constant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    #[error("Label mismatch: expected {expected:?}, found {found:?}")]
    LabelMismatch { expected: &'static str, found: String },

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    #[error("Invalid byte-order mark {0:#06X}")]
    ByteOrderMark(u16),

    #[error("Fixed array of {expected} elements cannot hold {found}")]
    FixedLength { expected: usize, found: usize },

    #[error("Collection of at most {max} elements cannot hold {found}")]
    CountMismatch { max: usize, found: usize },

    #[error("Collection length {0} does not fit in memory")]
    CountOverflow(u64),

    #[error("Text field is not valid UTF-8")]
    InvalidText,
}

// -----------------------------------------------------------------------------
// CapacityError

/// A bounded buffer ran out of room or input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CapacityError {
    #[error("Buffer overflow: {required} bytes required, {remaining} remaining")]
    Overflow { required: usize, remaining: usize },

    #[error("Buffer underflow: {required} bytes required, {remaining} remaining")]
    Underflow { required: usize, remaining: usize },
}

#[cfg(test)]
mod tests {
    use super::{CapacityError, FormatError, VisitError};
    use alloc::string::ToString;

    #[test]
    fn messages_and_predicates() {
        let err = VisitError::from(FormatError::ByteOrderMark(0x1234));
        assert!(err.is_format());
        assert_eq!(err.to_string(), "Invalid byte-order mark 0x1234");

        let err = VisitError::from(CapacityError::Overflow {
            required: 8,
            remaining: 3,
        });
        assert!(err.is_capacity());
        assert!(!err.is_allocation());
    }
}
