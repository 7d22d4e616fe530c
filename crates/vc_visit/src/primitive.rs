//! The closed set of primitive kinds a backend has to handle.
//!
//! Every value crossing a visitor is one of eight fixed-width integer
//! kinds. Single values travel as [`Scalar`] / [`ScalarMut`], bulk runs as
//! [`Run`] / [`RunMut`]. Backends match on these enums exhaustively, so a
//! new primitive kind is a compile error in every backend rather than a
//! silent fallthrough.
//!
//! All byte encodings here are native-endian.

use core::fmt;

/// Size of the scratch buffer used when converting runs to and from bytes.
pub const CHUNK_BYTES: usize = 256;

// -----------------------------------------------------------------------------
// PrimitiveType

/// Tag naming one primitive kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl PrimitiveType {
    /// Encoded width in bytes.
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 => 4,
            Self::I64 | Self::U64 => 8,
        }
    }

    /// Rust spelling of the type.
    pub const fn name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Value carriers

/// One primitive value, read out of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
}

/// A slot for one primitive value, about to be written into an object.
#[derive(Debug)]
pub enum ScalarMut<'a> {
    I8(&'a mut i8),
    U8(&'a mut u8),
    I16(&'a mut i16),
    U16(&'a mut u16),
    I32(&'a mut i32),
    U32(&'a mut u32),
    I64(&'a mut i64),
    U64(&'a mut u64),
}

/// A contiguous run of primitives, read out of an object.
#[derive(Debug, Clone, Copy)]
pub enum Run<'a> {
    I8(&'a [i8]),
    U8(&'a [u8]),
    I16(&'a [i16]),
    U16(&'a [u16]),
    I32(&'a [i32]),
    U32(&'a [u32]),
    I64(&'a [i64]),
    U64(&'a [u64]),
}

/// A contiguous run of primitive slots, about to be filled.
#[derive(Debug)]
pub enum RunMut<'a> {
    I8(&'a mut [i8]),
    U8(&'a mut [u8]),
    I16(&'a mut [i16]),
    U16(&'a mut [u16]),
    I32(&'a mut [i32]),
    U32(&'a mut [u32]),
    I64(&'a mut [i64]),
    U64(&'a mut [u64]),
}

macro_rules! for_each_variant {
    ($value:expr, $bind:ident => $body:expr) => {
        match $value {
            Self::I8($bind) => $body,
            Self::U8($bind) => $body,
            Self::I16($bind) => $body,
            Self::U16($bind) => $body,
            Self::I32($bind) => $body,
            Self::U32($bind) => $body,
            Self::I64($bind) => $body,
            Self::U64($bind) => $body,
        }
    };
}

macro_rules! primitive_type_of {
    ($value:expr) => {
        match $value {
            Self::I8(..) => PrimitiveType::I8,
            Self::U8(..) => PrimitiveType::U8,
            Self::I16(..) => PrimitiveType::I16,
            Self::U16(..) => PrimitiveType::U16,
            Self::I32(..) => PrimitiveType::I32,
            Self::U32(..) => PrimitiveType::U32,
            Self::I64(..) => PrimitiveType::I64,
            Self::U64(..) => PrimitiveType::U64,
        }
    };
}

impl Scalar {
    /// Kind of the carried value.
    pub const fn primitive_type(&self) -> PrimitiveType {
        primitive_type_of!(self)
    }

    /// Writes the native-endian encoding into `out` and returns the used prefix.
    pub fn encode(self, out: &mut [u8; 8]) -> &[u8] {
        let width = self.primitive_type().width();
        for_each_variant!(self, v => v.write_ne(&mut out[..width]));
        &out[..width]
    }
}

impl ScalarMut<'_> {
    /// Kind of the slot.
    pub const fn primitive_type(&self) -> PrimitiveType {
        primitive_type_of!(self)
    }

    /// Fills the slot from the native-endian encoding held in the first
    /// [`width`](PrimitiveType::width) bytes of `bytes`.
    ///
    /// The counterpart of [`Scalar::encode`]; trailing bytes are ignored.
    pub fn decode(&mut self, bytes: &[u8; 8]) {
        let width = self.primitive_type().width();
        for_each_variant!(self, slot => **slot = NeBytes::read_ne(&bytes[..width]));
    }
}

impl Run<'_> {
    /// Kind of the elements.
    pub const fn primitive_type(&self) -> PrimitiveType {
        primitive_type_of!(self)
    }

    /// Number of elements.
    pub const fn len(&self) -> usize {
        for_each_variant!(self, items => items.len())
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encoded size in bytes.
    pub const fn byte_len(&self) -> usize {
        self.len() * self.primitive_type().width()
    }

    /// Feeds the native-endian encoding to `sink`, in chunks.
    ///
    /// Byte runs are passed through in a single call.
    pub fn encode_chunks<E>(&self, mut sink: impl FnMut(&[u8]) -> Result<(), E>) -> Result<(), E> {
        match self {
            Self::U8(bytes) => sink(bytes),
            _ => for_each_variant!(*self, items => encode_items(items, &mut sink)),
        }
    }
}

impl RunMut<'_> {
    /// Kind of the elements.
    pub const fn primitive_type(&self) -> PrimitiveType {
        primitive_type_of!(self)
    }

    /// Number of elements.
    pub const fn len(&self) -> usize {
        for_each_variant!(self, items => items.len())
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encoded size in bytes.
    pub const fn byte_len(&self) -> usize {
        self.len() * self.primitive_type().width()
    }

    /// Fills every element from bytes produced by `source`, in chunks.
    ///
    /// `source` must fill the whole buffer it is handed. Byte runs are
    /// filled in a single call.
    pub fn decode_chunks<E>(
        &mut self,
        mut source: impl FnMut(&mut [u8]) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Self::U8(bytes) => source(bytes),
            _ => for_each_variant!(self, items => decode_items(&mut **items, &mut source)),
        }
    }
}

// -----------------------------------------------------------------------------
// Native-endian codec

trait NeBytes: Copy {
    const WIDTH: usize;

    fn write_ne(self, out: &mut [u8]);

    fn read_ne(bytes: &[u8]) -> Self;
}

macro_rules! impl_ne_bytes {
    ($($ty:ty),*) => {$(
        impl NeBytes for $ty {
            const WIDTH: usize = size_of::<$ty>();

            #[inline(always)]
            fn write_ne(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_ne_bytes());
            }

            #[inline(always)]
            fn read_ne(bytes: &[u8]) -> Self {
                let mut raw = [0u8; size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_ne_bytes(raw)
            }
        }
    )*};
}

impl_ne_bytes!(i8, u8, i16, u16, i32, u32, i64, u64);

fn encode_items<T: NeBytes, E>(
    items: &[T],
    sink: &mut impl FnMut(&[u8]) -> Result<(), E>,
) -> Result<(), E> {
    let mut scratch = [0u8; CHUNK_BYTES];
    for chunk in items.chunks(CHUNK_BYTES / T::WIDTH) {
        for (dst, value) in scratch.chunks_exact_mut(T::WIDTH).zip(chunk) {
            value.write_ne(dst);
        }
        sink(&scratch[..chunk.len() * T::WIDTH])?;
    }
    Ok(())
}

fn decode_items<T: NeBytes, E>(
    items: &mut [T],
    source: &mut impl FnMut(&mut [u8]) -> Result<(), E>,
) -> Result<(), E> {
    let mut scratch = [0u8; CHUNK_BYTES];
    for chunk in items.chunks_mut(CHUNK_BYTES / T::WIDTH) {
        let bytes = &mut scratch[..chunk.len() * T::WIDTH];
        source(bytes)?;
        for (value, src) in chunk.iter_mut().zip(bytes.chunks_exact(T::WIDTH)) {
            *value = T::read_ne(src);
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Primitive

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width integer that backends encode directly.
///
/// Implemented for `i8`, `u8`, `i16`, `u16`, `i32`, `u32`, `i64` and `u64`.
/// Character codes are carried as their integer representation.
pub trait Primitive:
    sealed::Sealed
    + Copy
    + Default
    + PartialEq
    + fmt::Debug
    + serde_core::Serialize
    + Send
    + Sync
    + 'static
{
    /// Tag for this kind.
    const TYPE: PrimitiveType;

    fn into_scalar(self) -> Scalar;

    fn as_scalar_mut(&mut self) -> ScalarMut<'_>;

    fn as_run(items: &[Self]) -> Run<'_>;

    fn as_run_mut(items: &mut [Self]) -> RunMut<'_>;
}

macro_rules! impl_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl Primitive for $ty {
            const TYPE: PrimitiveType = PrimitiveType::$variant;

            #[inline(always)]
            fn into_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }

            #[inline(always)]
            fn as_scalar_mut(&mut self) -> ScalarMut<'_> {
                ScalarMut::$variant(self)
            }

            #[inline(always)]
            fn as_run(items: &[Self]) -> Run<'_> {
                Run::$variant(items)
            }

            #[inline(always)]
            fn as_run_mut(items: &mut [Self]) -> RunMut<'_> {
                RunMut::$variant(items)
            }
        }
    )*};
}

impl_primitive! {
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
}

#[cfg(test)]
mod tests {
    use super::{Primitive, PrimitiveType, Run, RunMut, Scalar, ScalarMut};
    use alloc::string::ToString;
    use alloc::vec::Vec;

    #[test]
    fn scalar_encoding_is_native_endian() {
        let mut out = [0u8; 8];
        let bytes = Scalar::U16(0xFEFF).encode(&mut out);
        assert_eq!(bytes, &0xFEFF_u16.to_ne_bytes());

        let mut value = 0u16;
        ScalarMut::U16(&mut value).decode(&out);
        assert_eq!(value, 0xFEFF);
    }

    #[test]
    fn decoding_reads_only_the_slot_width() {
        let mut out = [0xAAu8; 8];
        Scalar::I32(-2).encode(&mut out);

        let (mut narrow, mut wide) = (0u8, 0i32);
        ScalarMut::U8(&mut narrow).decode(&out);
        ScalarMut::I32(&mut wide).decode(&out);
        assert_eq!(narrow, (-2i32).to_ne_bytes()[0]);
        assert_eq!(wide, -2);

        let mut full = 0u64;
        ScalarMut::U64(&mut full).decode(&[7; 8]);
        assert_eq!(full, u64::from_ne_bytes([7; 8]));
    }

    #[test]
    fn run_chunks_cover_long_runs() {
        let values: Vec<i32> = (-300..300).collect();
        let run = i32::as_run(&values);
        assert_eq!(run.byte_len(), 600 * 4);

        let mut encoded = Vec::new();
        run.encode_chunks::<()>(|chunk| {
            assert!(chunk.len() <= crate::CHUNK_BYTES);
            encoded.extend_from_slice(chunk);
            Ok(())
        })
        .unwrap();
        assert_eq!(encoded.len(), 2400);

        let mut decoded = alloc::vec![0i32; 600];
        let mut offset = 0;
        RunMut::I32(&mut decoded)
            .decode_chunks::<()>(|dst| {
                dst.copy_from_slice(&encoded[offset..offset + dst.len()]);
                offset += dst.len();
                Ok(())
            })
            .unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn tags_and_widths() {
        assert_eq!(<u64 as Primitive>::TYPE.width(), 8);
        assert_eq!(Run::U8(&[1, 2, 3]).primitive_type(), PrimitiveType::U8);
        assert_eq!(PrimitiveType::I16.to_string(), "i16");
    }
}
