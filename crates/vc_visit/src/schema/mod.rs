//! Declarative per-type schemas.
//!
//! A [`Schema<T>`] is the ordered list of [`FieldAction`]s describing how to
//! reach and classify each persisted field of `T`. Serialization and
//! deserialization walk the same list in the same order, so a field written
//! N-th is read back N-th.
//!
//! Schemas are built with a chain of builder calls inside
//! [`Visit::build_schema`](crate::Visit::build_schema). Fields are reached
//! through [`Lens`]es, or through plain function pointers for computed
//! values.

mod lens;
mod ops;
mod registry;

pub use lens::Lens;
pub use registry::schema_of;

pub use ops::{read_text, write_text};

pub(crate) use ops::{FieldOps, FieldView};

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::element::Element;
use crate::error::VisitError;
use crate::primitive::Primitive;
use crate::visitor::{ConstVisitor, EncodedSize, Length, Visitor};

use ops::{
    ArraySlots, CountedSlots, DirectOps, FnSlots, GetterSetterOps, MemberOps, OptionalOps,
    ReadHookOps, SequenceOps, TextOps, VecSlots,
};

/// Sequences and optionals: a count, possibly zero.
const PREFIX_ONLY: EncodedSize = EncodedSize::new(0, 1);

// -----------------------------------------------------------------------------
// FieldKind

/// Classification of a schema slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A single fixed-width integer.
    Primitive,
    /// A nested composite with its own schema.
    Composite,
    /// `N` elements with no count on the wire.
    FixedArray,
    /// A count followed by that many elements.
    GrowableSequence,
    /// Zero or one composite behind an owning box.
    OptionalComposite,
    /// A primitive produced by a getter and consumed by a setter.
    GetterSetter,
    /// Raw visitor access, for computed flags and post-read fixups.
    Direct,
}

// -----------------------------------------------------------------------------
// FieldAction

/// One entry of a [`Schema`].
pub struct FieldAction<T> {
    name: &'static str,
    kind: FieldKind,
    ops: Box<dyn FieldOps<T>>,
}

impl<T> FieldAction<T> {
    /// Name given to the field when the schema was built.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// How the field is encoded.
    #[inline]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    pub(crate) fn ops(&self) -> &dyn FieldOps<T> {
        &*self.ops
    }
}

impl<T> fmt::Debug for FieldAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAction")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Schema

/// The ordered field actions of `T`.
///
/// # Examples
///
/// ```
/// use vc_visit::{FieldKind, Schema, Visit, lens, schema_of};
///
/// #[derive(Default)]
/// struct Record {
///     id: u32,
///     tags: Vec<u16>,
///     name: String,
/// }
///
/// impl Visit for Record {
///     fn build_schema() -> Schema<Self> {
///         Schema::new()
///             .member("id", lens!(Record, id))
///             .sequence("tags", lens!(Record, tags))
///             .text("name", lens!(Record, name))
///     }
/// }
///
/// let schema = schema_of::<Record>();
/// assert_eq!(schema.len(), 3);
/// assert_eq!(schema.field("tags").unwrap().kind(), FieldKind::GrowableSequence);
/// ```
pub struct Schema<T> {
    type_name: &'static str,
    fields: Vec<FieldAction<T>>,
    encoded_size: EncodedSize,
}

impl<T: 'static> Schema<T> {
    /// Creates a schema with no fields.
    pub fn new() -> Self {
        Self {
            type_name: core::any::type_name::<T>(),
            fields: Vec::new(),
            encoded_size: EncodedSize::ZERO,
        }
    }

    #[inline]
    fn push(
        mut self,
        name: &'static str,
        kind: FieldKind,
        size: EncodedSize,
        ops: impl FieldOps<T> + 'static,
    ) -> Self {
        self.encoded_size = self.encoded_size.plus(size);
        self.fields.push(FieldAction {
            name,
            kind,
            ops: Box::new(ops),
        });
        self
    }

    /// A primitive or composite field.
    ///
    /// The kind is [`FieldKind::Primitive`] or [`FieldKind::Composite`]
    /// depending on `F`.
    pub fn member<F: Element>(self, name: &'static str, lens: Lens<T, F>) -> Self {
        let kind = match F::PRIMITIVE {
            Some(_) => FieldKind::Primitive,
            None => FieldKind::Composite,
        };
        self.push(name, kind, F::encoded_size(), MemberOps { lens })
    }

    /// A fixed-size array, encoded as exactly `N` elements with no count.
    ///
    /// Deserialization fails with
    /// [`FormatError::FixedLength`](crate::FormatError::FixedLength) if the
    /// visitor announces any other count.
    pub fn array<F: Element, const N: usize>(
        self,
        name: &'static str,
        lens: Lens<T, [F; N]>,
    ) -> Self {
        let ops = SequenceOps {
            slots: ArraySlots { lens },
            length: Length::Fixed(N),
            _marker: PhantomData,
        };
        self.push(name, FieldKind::FixedArray, F::encoded_size().times(N), ops)
    }

    /// A vector, encoded as a count followed by the elements.
    pub fn sequence<F: Element>(self, name: &'static str, lens: Lens<T, Vec<F>>) -> Self {
        let ops = SequenceOps {
            slots: VecSlots { lens },
            length: Length::Prefixed,
            _marker: PhantomData,
        };
        self.push(name, FieldKind::GrowableSequence, PREFIX_ONLY, ops)
    }

    /// UTF-8 text, encoded as a byte sequence.
    pub fn text(self, name: &'static str, lens: Lens<T, String>) -> Self {
        self.push(name, FieldKind::GrowableSequence, PREFIX_ONLY, TextOps { lens })
    }

    /// A heap blob paired with an explicit count field.
    ///
    /// Only the blob is encoded (as a sequence); on read, `count` is set to
    /// the decoded length.
    pub fn counted<F, C>(
        self,
        name: &'static str,
        data: Lens<T, Box<[F]>>,
        count: Lens<T, C>,
    ) -> Self
    where
        F: Element,
        C: Primitive + TryFrom<usize>,
    {
        let ops = SequenceOps {
            slots: CountedSlots { data, count },
            length: Length::Prefixed,
            _marker: PhantomData,
        };
        self.push(name, FieldKind::GrowableSequence, PREFIX_ONLY, ops)
    }

    /// A sequence reached through a getter and a resizer.
    ///
    /// `resize` must leave the collection holding exactly the requested
    /// number of elements and return them.
    pub fn collection<F: Element>(
        self,
        name: &'static str,
        get: fn(&T) -> &[F],
        resize: fn(&mut T, usize) -> Result<&mut [F], VisitError>,
    ) -> Self {
        let ops = SequenceOps {
            slots: FnSlots { get, resize },
            length: Length::Prefixed,
            _marker: PhantomData,
        };
        self.push(name, FieldKind::GrowableSequence, PREFIX_ONLY, ops)
    }

    /// Zero or one boxed element, encoded as a sequence of length 0 or 1.
    ///
    /// On read, length 0 clears the field and length 1 allocates a fresh
    /// `F::default()` before filling it.
    pub fn optional<F: Element>(self, name: &'static str, lens: Lens<T, Option<Box<F>>>) -> Self {
        self.push(name, FieldKind::OptionalComposite, PREFIX_ONLY, OptionalOps { lens })
    }

    /// A computed primitive.
    ///
    /// `get` produces the value written; `set` receives the value read and
    /// may reject it, aborting the traversal.
    pub fn getter_setter<F: Primitive>(
        self,
        name: &'static str,
        get: fn(&T) -> F,
        set: fn(&mut T, F) -> Result<(), VisitError>,
    ) -> Self {
        let size = EncodedSize::new(F::TYPE.width(), 0);
        self.push(name, FieldKind::GetterSetter, size, GetterSetterOps { get, set })
    }

    /// Raw access to the visitor at this point of the traversal.
    pub fn direct(
        self,
        name: &'static str,
        on_write: fn(&T, &mut dyn ConstVisitor) -> Result<(), VisitError>,
        on_read: fn(&mut T, &mut dyn Visitor) -> Result<(), VisitError>,
    ) -> Self {
        self.push(name, FieldKind::Direct, EncodedSize::ZERO, DirectOps { on_write, on_read })
    }

    /// A hook run on read once every earlier field has been filled in.
    ///
    /// Writes nothing.
    pub fn on_read(self, name: &'static str, hook: fn(&mut T) -> Result<(), VisitError>) -> Self {
        self.push(name, FieldKind::Direct, EncodedSize::ZERO, ReadHookOps { hook })
    }
}

impl<T> Schema<T> {
    /// Name of `T`, for diagnostics.
    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Number of field actions.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Field actions in traversal order.
    #[inline]
    pub fn fields(&self) -> &[FieldAction<T>] {
        &self.fields
    }

    /// Lower bound on the encoded size of one `T`.
    ///
    /// Direct hooks count as empty, every sequence as an empty one.
    #[inline]
    pub const fn encoded_size(&self) -> EncodedSize {
        self.encoded_size
    }

    /// Looks up a field action by name.
    pub fn field(&self, name: &str) -> Option<&FieldAction<T>> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl<T: 'static> Default for Schema<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}
