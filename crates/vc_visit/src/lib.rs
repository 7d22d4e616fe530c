//! Schema-driven, non-recursive binary persistence.
//!
//! A type opts in by implementing [`Visit`], which describes its persisted
//! fields as an ordered [`Schema`]. One traversal engine walks any value
//! through its schema and reports every field to a visitor:
//!
//! - a [`ConstVisitor`] observes a value, e.g. the binary [`Serializer`];
//! - a [`Visitor`] fills one in, e.g. the binary [`Deserializer`].
//!
//! The walk keeps its own frame stack on the heap, so deeply nested or very
//! wide object graphs do not consume the thread's stack.
//!
//! # Examples
//!
//! ```
//! use vc_visit::{Schema, Visit, lens};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Track {
//!     title: String,
//!     samples: Vec<i16>,
//!     cover: Option<Box<Art>>,
//! }
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Art {
//!     size: [u16; 2],
//! }
//!
//! impl Visit for Art {
//!     fn build_schema() -> Schema<Self> {
//!         Schema::new().array("size", lens!(Art, size))
//!     }
//! }
//!
//! impl Visit for Track {
//!     fn build_schema() -> Schema<Self> {
//!         Schema::new()
//!             .text("title", lens!(Track, title))
//!             .sequence("samples", lens!(Track, samples))
//!             .optional("cover", lens!(Track, cover))
//!     }
//! }
//!
//! let track = Track {
//!     title: "intro".into(),
//!     samples: vec![0, 512, -512],
//!     cover: Some(Box::new(Art { size: [64, 64] })),
//! };
//!
//! let bytes = vc_visit::serialize_to_vec(&track).unwrap();
//! assert_eq!(vc_visit::from_slice::<Track>(&bytes).unwrap(), track);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// std support

// Stream buffers and the schema registry's lock need `std`; everything else
// is written against `core` and `alloc`.
extern crate alloc;
extern crate std;

mod element;
mod error;
mod header;
mod primitive;
mod visitor;

pub mod backend;
pub mod engine;
pub mod schema;
pub mod serde;

pub use backend::{
    DeserializeOptions, Deserializer, ReadBuffer, Serializer, WriteBuffer, deserialize,
    deserialize_from_reader, deserialize_from_slice, from_slice, serialize, serialize_to_slice,
    serialize_to_vec, serialize_to_writer,
};
pub use element::{Element, Visit};
pub use engine::{ConstVisitContext, VisitContext, visit, visit_mut};
pub use error::{CapacityError, FormatError, VisitError};
pub use header::{HeaderFlags, SerializationHeader};
pub use primitive::{CHUNK_BYTES, Primitive, PrimitiveType, Run, RunMut, Scalar, ScalarMut};
pub use schema::{FieldAction, FieldKind, Lens, Schema, read_text, schema_of, write_text};
pub use self::serde::SchemaSerializer;
pub use visitor::{ConstVisitor, EncodedSize, Length, RunBuffer, Visitor};

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::{
        ConstVisitor, FieldKind, FormatError, Schema, Visit, VisitError, Visitor, from_slice,
        lens, schema_of, serialize_to_vec,
    };

    #[derive(Default, Debug, PartialEq)]
    struct Pixel {
        level: u8,
    }

    impl Visit for Pixel {
        fn build_schema() -> Schema<Self> {
            Schema::new().member("level", lens!(Pixel, level))
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct Inner {
        id: u64,
        weights: [i32; 2],
    }

    impl Visit for Inner {
        fn build_schema() -> Schema<Self> {
            Schema::new()
                .member("id", lens!(Inner, id))
                .array("weights", lens!(Inner, weights))
        }
    }

    /// One field of every kind.
    #[derive(Default, Debug, PartialEq)]
    struct Everything {
        small: i8,
        inner: Inner,
        corners: [Pixel; 2],
        list: Vec<Inner>,
        name: String,
        blob_len: u32,
        blob: Box<[u16]>,
        slots: Vec<Pixel>,
        child: Option<Box<Inner>>,
        flipped: bool,
        checksum_seen: bool,
    }

    fn slots(value: &Everything) -> &[Pixel] {
        &value.slots
    }

    fn resize_slots(value: &mut Everything, count: usize) -> Result<&mut [Pixel], VisitError> {
        value.slots.clear();
        value.slots.resize_with(count, Pixel::default);
        Ok(value.slots.as_mut_slice())
    }

    fn write_flipped(value: &Everything, visitor: &mut dyn ConstVisitor) -> Result<(), VisitError> {
        visitor.visit_primitive(crate::Scalar::U8(u8::from(value.flipped)))
    }

    fn read_flipped(value: &mut Everything, visitor: &mut dyn Visitor) -> Result<(), VisitError> {
        let mut raw = 0u8;
        visitor.visit_primitive(crate::ScalarMut::U8(&mut raw))?;
        value.flipped = raw != 0;
        Ok(())
    }

    impl Visit for Everything {
        fn build_schema() -> Schema<Self> {
            Schema::new()
                .member("small", lens!(Everything, small))
                .member("inner", lens!(Everything, inner))
                .array("corners", lens!(Everything, corners))
                .sequence("list", lens!(Everything, list))
                .text("name", lens!(Everything, name))
                .counted("blob", lens!(Everything, blob), lens!(Everything, blob_len))
                .collection("slots", slots, resize_slots)
                .optional("child", lens!(Everything, child))
                .direct("flipped", write_flipped, read_flipped)
                .getter_setter(
                    "checksum",
                    |value: &Everything| value.blob.iter().map(|&x| u32::from(x)).sum::<u32>(),
                    |value: &mut Everything, sum: u32| {
                        let expected: u32 = value.blob.iter().map(|&x| u32::from(x)).sum();
                        if sum != expected {
                            return Err(FormatError::CountMismatch {
                                max: expected as usize,
                                found: sum as usize,
                            }
                            .into());
                        }
                        value.checksum_seen = true;
                        Ok(())
                    },
                )
        }
    }

    fn everything() -> Everything {
        Everything {
            small: -7,
            inner: Inner {
                id: u64::MAX - 1,
                weights: [-1, 1],
            },
            corners: [Pixel { level: 10 }, Pixel { level: 20 }],
            list: vec![
                Inner {
                    id: 1,
                    weights: [2, 3],
                },
                Inner {
                    id: 4,
                    weights: [5, 6],
                },
            ],
            name: String::from("every kind"),
            blob_len: 3,
            blob: vec![100, 200, 300].into_boxed_slice(),
            slots: vec![Pixel { level: 1 }],
            child: Some(Box::new(Inner {
                id: 99,
                weights: [0, 0],
            })),
            flipped: true,
            checksum_seen: false,
        }
    }

    #[test]
    fn every_kind_round_trips() {
        let original = everything();
        let bytes = serialize_to_vec(&original).unwrap();
        let decoded: Everything = from_slice(&bytes).unwrap();

        assert!(decoded.checksum_seen);
        assert_eq!(
            decoded,
            Everything {
                checksum_seen: true,
                ..original
            }
        );
    }

    #[test]
    fn counted_blob_sets_its_count() {
        let mut original = everything();
        original.blob_len = 0;
        let bytes = serialize_to_vec(&original).unwrap();
        let decoded: Everything = from_slice(&bytes).unwrap();
        assert_eq!(decoded.blob_len, 3);
    }

    #[test]
    fn setter_can_reject() {
        let mut bytes = serialize_to_vec(&everything()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x40;
        // Flipping a bit of the checksum is caught by its setter.
        let err = from_slice::<Everything>(&bytes).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn kinds_are_classified() {
        let kinds: Vec<FieldKind> = schema_of::<Everything>()
            .fields()
            .iter()
            .map(|field| field.kind())
            .collect();

        assert_eq!(
            kinds,
            [
                FieldKind::Primitive,
                FieldKind::Composite,
                FieldKind::FixedArray,
                FieldKind::GrowableSequence,
                FieldKind::GrowableSequence,
                FieldKind::GrowableSequence,
                FieldKind::GrowableSequence,
                FieldKind::OptionalComposite,
                FieldKind::Direct,
                FieldKind::GetterSetter,
            ]
        );
    }
}
