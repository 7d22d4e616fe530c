//! Capability interfaces implemented by serialization backends.
//!
//! The names follow the direction values travel relative to the visited
//! object, not what happens to the byte sink:
//!
//! - [`ConstVisitor`] receives values read *out of* an object. Serializers
//!   implement it.
//! - [`Visitor`] produces values written *into* an object. Deserializers
//!   implement it.
//!
//! Both interfaces are object safe; the traversal engine drives them
//! through `&mut dyn` references.

use crate::error::VisitError;
use crate::primitive::{PrimitiveType, Run, RunMut, Scalar, ScalarMut};

/// How the element count of a collection appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// The count is fixed by the schema and is not encoded.
    Fixed(usize),
    /// The count is encoded in front of the elements.
    Prefixed,
}

impl Length {
    /// Returns the schema-fixed count, if any.
    #[inline]
    pub const fn fixed(self) -> Option<usize> {
        match self {
            Self::Fixed(n) => Some(n),
            Self::Prefixed => None,
        }
    }
}

// -----------------------------------------------------------------------------
// EncodedSize

/// Lower bound on what one value always puts on the wire.
///
/// Reported by schemas so that a visitor reading from a bounded source can
/// reject element counts the input cannot possibly hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EncodedSize {
    /// Bytes of primitives that are present whatever the value.
    pub primitive_bytes: usize,
    /// Count prefixes that are present whatever the value.
    pub prefixes: usize,
}

impl EncodedSize {
    pub const ZERO: Self = Self::new(0, 0);

    #[inline]
    pub const fn new(primitive_bytes: usize, prefixes: usize) -> Self {
        Self {
            primitive_bytes,
            prefixes,
        }
    }

    /// Total bytes for a backend whose count prefixes take `count_bytes`.
    #[inline]
    pub const fn bytes(self, count_bytes: usize) -> usize {
        self.primitive_bytes
            .saturating_add(self.prefixes.saturating_mul(count_bytes))
    }

    #[inline]
    pub const fn plus(self, other: Self) -> Self {
        Self {
            primitive_bytes: self.primitive_bytes.saturating_add(other.primitive_bytes),
            prefixes: self.prefixes.saturating_add(other.prefixes),
        }
    }

    #[inline]
    pub const fn times(self, count: usize) -> Self {
        Self {
            primitive_bytes: self.primitive_bytes.saturating_mul(count),
            prefixes: self.prefixes.saturating_mul(count),
        }
    }
}

// -----------------------------------------------------------------------------
// ConstVisitor

/// Receives the values of an object, in schema order.
pub trait ConstVisitor {
    /// One primitive field.
    fn visit_primitive(&mut self, value: Scalar) -> Result<(), VisitError>;

    /// A collection whose elements are primitives.
    fn visit_primitive_run(&mut self, run: Run<'_>, length: Length) -> Result<(), VisitError>;

    /// The start of a nested composite.
    ///
    /// Its fields follow as further calls.
    fn visit_element(&mut self) -> Result<(), VisitError>;

    /// The start of a collection of `count` composites.
    ///
    /// Each element is then announced with [`visit_element`](Self::visit_element).
    fn visit_collection(&mut self, count: usize, length: Length) -> Result<(), VisitError>;
}

// -----------------------------------------------------------------------------
// Visitor

/// Destination storage for a primitive run being decoded.
///
/// The backend learns the count (from the wire or from [`length`](Self::length)),
/// asks the buffer to [`resize`](Self::resize), then fills the returned slice.
pub trait RunBuffer {
    /// Wire form of the count.
    fn length(&self) -> Length;

    /// Kind of the elements.
    fn primitive_type(&self) -> PrimitiveType;

    /// Resizes the destination to exactly `count` elements.
    ///
    /// Fails with [`FormatError::FixedLength`](crate::FormatError::FixedLength)
    /// if the destination has a fixed size other than `count`.
    fn resize(&mut self, count: usize) -> Result<RunMut<'_>, VisitError>;
}

/// Supplies the values of an object, in schema order.
pub trait Visitor {
    /// One primitive field.
    fn visit_primitive(&mut self, slot: ScalarMut<'_>) -> Result<(), VisitError>;

    /// A collection whose elements are primitives.
    fn visit_primitive_run(&mut self, buffer: &mut dyn RunBuffer) -> Result<(), VisitError>;

    /// The start of a nested composite.
    fn visit_element(&mut self) -> Result<(), VisitError>;

    /// The start of a collection of composites; returns the element count.
    ///
    /// Implementations return `n` for [`Length::Fixed(n)`](Length::Fixed)
    /// without consuming input.
    fn visit_collection(&mut self, length: Length) -> Result<usize, VisitError>;

    /// Called before `count` composites of at least `element` each are
    /// allocated.
    ///
    /// Bounded sources fail here instead of letting a corrupt count reserve
    /// memory the input cannot fill.
    #[inline]
    fn reserve_collection(&mut self, count: usize, element: EncodedSize) -> Result<(), VisitError> {
        let _ = (count, element);
        Ok(())
    }
}

impl<V: ConstVisitor + ?Sized> ConstVisitor for &mut V {
    #[inline]
    fn visit_primitive(&mut self, value: Scalar) -> Result<(), VisitError> {
        (**self).visit_primitive(value)
    }

    #[inline]
    fn visit_primitive_run(&mut self, run: Run<'_>, length: Length) -> Result<(), VisitError> {
        (**self).visit_primitive_run(run, length)
    }

    #[inline]
    fn visit_element(&mut self) -> Result<(), VisitError> {
        (**self).visit_element()
    }

    #[inline]
    fn visit_collection(&mut self, count: usize, length: Length) -> Result<(), VisitError> {
        (**self).visit_collection(count, length)
    }
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    #[inline]
    fn visit_primitive(&mut self, slot: ScalarMut<'_>) -> Result<(), VisitError> {
        (**self).visit_primitive(slot)
    }

    #[inline]
    fn visit_primitive_run(&mut self, buffer: &mut dyn RunBuffer) -> Result<(), VisitError> {
        (**self).visit_primitive_run(buffer)
    }

    #[inline]
    fn visit_element(&mut self) -> Result<(), VisitError> {
        (**self).visit_element()
    }

    #[inline]
    fn visit_collection(&mut self, length: Length) -> Result<usize, VisitError> {
        (**self).visit_collection(length)
    }

    #[inline]
    fn reserve_collection(&mut self, count: usize, element: EncodedSize) -> Result<(), VisitError> {
        (**self).reserve_collection(count, element)
    }
}
