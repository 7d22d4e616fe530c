//! The binary format.
//!
//! [`Serializer`] and [`Deserializer`] are visitors over a byte buffer. The
//! encoding carries no type information, tags or padding: a value is the
//! concatenation of its fields in schema order, so reading it back requires
//! the same schema that wrote it.
//!
//! | Field kind        | Encoding                                  |
//! |-------------------|-------------------------------------------|
//! | Primitive         | host byte order, natural width            |
//! | Composite         | its fields, in order                      |
//! | Fixed array       | `N` elements, no count                    |
//! | Growable sequence | `u64` count, then the elements            |
//! | Optional          | a sequence of length 0 or 1               |
//! | Getter/setter     | the primitive produced by the getter      |

mod buffer;
mod deserializer;
mod serializer;

pub use buffer::{
    ReadBuffer, SliceReader, SliceWriter, StreamReader, StreamWriter, VecWriter, WriteBuffer,
};
pub use deserializer::{DeserializeOptions, Deserializer};
pub use serializer::Serializer;

use alloc::vec::Vec;
use std::io;

use crate::element::Visit;
use crate::error::VisitError;

// -----------------------------------------------------------------------------
// Shortcuts

/// Encodes `value` into `buffer` and hands the buffer back.
pub fn serialize<T: Visit, B: WriteBuffer>(value: &T, buffer: B) -> Result<B, VisitError> {
    let mut serializer = Serializer::new(buffer);
    serializer.serialize(value)?;
    Ok(serializer.into_inner())
}

/// Decodes from `buffer` into `value` and hands the buffer back.
pub fn deserialize<T: Visit, B: ReadBuffer>(value: &mut T, buffer: B) -> Result<B, VisitError> {
    let mut deserializer = Deserializer::new(buffer);
    deserializer.deserialize(value)?;
    Ok(deserializer.into_inner())
}

/// Encodes `value` into a new vector.
pub fn serialize_to_vec<T: Visit>(value: &T) -> Result<Vec<u8>, VisitError> {
    let mut serializer = Serializer::new(VecWriter::new());
    serializer.serialize(value)?;
    Ok(serializer.into_inner().into_inner())
}

/// Encodes `value` into `out`, returning the number of bytes written.
///
/// Fails with [`CapacityError::Overflow`](crate::CapacityError::Overflow)
/// if `out` is too small.
pub fn serialize_to_slice<T: Visit>(value: &T, out: &mut [u8]) -> Result<usize, VisitError> {
    let mut serializer = Serializer::new(SliceWriter::new(out));
    serializer.serialize(value)?;
    Ok(serializer.bytes_written())
}

/// Encodes `value` into `writer`, returning the number of bytes written.
pub fn serialize_to_writer<T: Visit, W: io::Write>(
    value: &T,
    writer: W,
) -> Result<usize, VisitError> {
    let mut serializer = Serializer::new(StreamWriter::new(writer));
    serializer.serialize(value)?;
    let written = serializer.bytes_written();
    serializer.into_inner().into_inner()?;
    Ok(written)
}

/// Decodes `bytes` into `value`, returning the number of bytes consumed.
///
/// Trailing bytes are left unread.
pub fn deserialize_from_slice<T: Visit>(value: &mut T, bytes: &[u8]) -> Result<usize, VisitError> {
    let mut deserializer = Deserializer::new(SliceReader::new(bytes));
    deserializer.deserialize(value)?;
    Ok(deserializer.bytes_read())
}

/// Decodes from `reader` into `value`, returning the number of bytes consumed.
pub fn deserialize_from_reader<T: Visit, R: io::Read>(
    value: &mut T,
    reader: R,
) -> Result<usize, VisitError> {
    let mut deserializer = Deserializer::new(StreamReader::new(reader));
    deserializer.deserialize(value)?;
    Ok(deserializer.bytes_read())
}

/// Decodes a fresh `T` from the start of `bytes`.
pub fn from_slice<T: Visit>(bytes: &[u8]) -> Result<T, VisitError> {
    Deserializer::new(SliceReader::new(bytes)).deserialize_new()
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{
        DeserializeOptions, Deserializer, SliceReader, VecWriter, deserialize,
        deserialize_from_slice, from_slice, serialize, serialize_to_slice, serialize_to_vec,
    };
    use crate::{
        CapacityError, EncodedSize, FormatError, Schema, Visit, VisitError, lens, schema_of,
    };

    #[derive(Default, Debug, PartialEq)]
    struct Point {
        x: i16,
        y: i16,
    }

    impl Visit for Point {
        fn build_schema() -> Schema<Self> {
            Schema::new()
                .member("x", lens!(Point, x))
                .member("y", lens!(Point, y))
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct Shape {
        id: u32,
        corners: [u8; 3],
        path: Vec<Point>,
        label: String,
        anchor: Option<Box<Point>>,
    }

    impl Visit for Shape {
        fn build_schema() -> Schema<Self> {
            Schema::new()
                .member("id", lens!(Shape, id))
                .array("corners", lens!(Shape, corners))
                .sequence("path", lens!(Shape, path))
                .text("label", lens!(Shape, label))
                .optional("anchor", lens!(Shape, anchor))
        }
    }

    fn sample() -> Shape {
        Shape {
            id: 0xA1B2_C3D4,
            corners: [1, 2, 3],
            path: vec![Point { x: -1, y: 2 }, Point { x: 3, y: -4 }],
            label: String::from("tri"),
            anchor: Some(Box::new(Point { x: 9, y: 9 })),
        }
    }

    #[test]
    fn layout_is_packed_and_native_endian() {
        let bytes = serialize_to_vec(&sample()).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&0xA1B2_C3D4u32.to_ne_bytes());
        expected.extend_from_slice(&[1, 2, 3]);
        expected.extend_from_slice(&2u64.to_ne_bytes());
        for value in [-1i16, 2, 3, -4] {
            expected.extend_from_slice(&value.to_ne_bytes());
        }
        expected.extend_from_slice(&3u64.to_ne_bytes());
        expected.extend_from_slice(b"tri");
        expected.extend_from_slice(&1u64.to_ne_bytes());
        expected.extend_from_slice(&9i16.to_ne_bytes());
        expected.extend_from_slice(&9i16.to_ne_bytes());

        assert_eq!(bytes, expected);
    }

    #[test]
    fn decoding_restores_the_value() {
        let original = sample();
        let bytes = serialize_to_vec(&original).unwrap();

        let mut decoded = Shape::default();
        let read = deserialize_from_slice(&mut decoded, &bytes).unwrap();
        assert_eq!(read, bytes.len());
        assert_eq!(decoded, original);
    }

    #[test]
    fn values_share_one_stream() {
        let first = sample();
        let second = Point { x: 5, y: 6 };
        let writer = serialize(&first, VecWriter::new()).unwrap();
        let bytes = serialize(&second, writer).unwrap().into_inner();

        let mut shape = Shape::default();
        let mut point = Point::default();
        let reader = deserialize(&mut shape, SliceReader::new(&bytes)).unwrap();
        let reader = deserialize(&mut point, reader).unwrap();

        assert_eq!(shape, first);
        assert_eq!(point, second);
        assert!(reader.rest().is_empty());
    }

    #[test]
    fn empty_optional_clears_the_target() {
        let bytes = serialize_to_vec(&Shape::default()).unwrap();
        let mut decoded = sample();
        deserialize_from_slice(&mut decoded, &bytes).unwrap();
        assert_eq!(decoded, Shape::default());
    }

    #[test]
    fn small_slices_overflow() {
        let mut out = [0u8; 8];
        let err = serialize_to_slice(&sample(), &mut out).unwrap_err();
        assert!(matches!(err, VisitError::Capacity(CapacityError::Overflow { .. })));
    }

    #[test]
    fn truncated_input_underflows() {
        let bytes = serialize_to_vec(&sample()).unwrap();
        for len in [0, 3, 10, bytes.len() - 1] {
            let err = from_slice::<Shape>(&bytes[..len]).unwrap_err();
            assert!(err.is_capacity(), "length {len}: {err}");
        }
    }

    #[test]
    fn oversized_counts_are_rejected_before_allocating() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_ne_bytes());
        bytes.extend_from_slice(&[0, 0, 0]);
        bytes.extend_from_slice(&u64::MAX.to_ne_bytes());

        let err = from_slice::<Shape>(&bytes).unwrap_err();
        assert!(matches!(
            err,
            VisitError::Format(FormatError::CountOverflow(_)) | VisitError::Allocation { .. }
        ));

        let options = DeserializeOptions {
            max_collection_len: 1,
        };
        let bytes = serialize_to_vec(&sample()).unwrap();
        let mut deserializer = Deserializer::with_options(SliceReader::new(&bytes), options);
        let err = deserializer.deserialize_new::<Shape>().unwrap_err();
        assert!(matches!(err, VisitError::Allocation { count: 2 }));
    }

    #[test]
    fn byte_runs_check_remaining_input() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_ne_bytes());
        bytes.extend_from_slice(&[0, 0, 0]);
        bytes.extend_from_slice(&0u64.to_ne_bytes());
        bytes.extend_from_slice(&1000u64.to_ne_bytes());
        bytes.extend_from_slice(b"short");

        let err = from_slice::<Shape>(&bytes).unwrap_err();
        assert!(matches!(
            err,
            VisitError::Capacity(CapacityError::Underflow {
                required: 1000,
                remaining: 5
            })
        ));
    }

    #[test]
    fn composite_counts_check_remaining_input() {
        assert_eq!(schema_of::<Point>().encoded_size(), EncodedSize::new(4, 0));
        assert_eq!(schema_of::<Shape>().encoded_size(), EncodedSize::new(7, 3));

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_ne_bytes());
        bytes.extend_from_slice(&[0, 0, 0]);
        bytes.extend_from_slice(&10_000_000u64.to_ne_bytes());
        bytes.extend_from_slice(&[0; 20]);

        let mut decoded = sample();
        let err = deserialize_from_slice(&mut decoded, &bytes).unwrap_err();
        assert!(matches!(
            err,
            VisitError::Capacity(CapacityError::Underflow {
                required: 40_000_000,
                remaining: 20
            })
        ));
        // Rejected before the destination was resized.
        assert_eq!(decoded.path, sample().path);
    }

    #[test]
    fn invalid_text_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_ne_bytes());
        bytes.extend_from_slice(&[0, 0, 0]);
        bytes.extend_from_slice(&0u64.to_ne_bytes());
        bytes.extend_from_slice(&2u64.to_ne_bytes());
        bytes.extend_from_slice(&[0xC3, 0x28]);
        bytes.extend_from_slice(&0u64.to_ne_bytes());

        let err = from_slice::<Shape>(&bytes).unwrap_err();
        assert!(matches!(err, VisitError::Format(FormatError::InvalidText)));
    }
}
