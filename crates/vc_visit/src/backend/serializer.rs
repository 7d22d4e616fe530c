use crate::backend::WriteBuffer;
use crate::element::Visit;
use crate::engine;
use crate::error::{FormatError, VisitError};
use crate::primitive::{Run, Scalar};
use crate::visitor::{ConstVisitor, Length};

/// Size of an encoded collection count.
pub(crate) const COUNT_BYTES: usize = size_of::<u64>();

/// Encodes objects into the binary format.
///
/// Primitives are written in host byte order at their natural width.
/// Growable sequences are preceded by their count as a `u64`; fixed-size
/// arrays are written bare. Composites add no bytes of their own.
#[derive(Debug)]
pub struct Serializer<B> {
    buffer: B,
}

impl<B: WriteBuffer> Serializer<B> {
    #[inline]
    pub const fn new(buffer: B) -> Self {
        Self { buffer }
    }

    /// Appends the encoding of `value`.
    ///
    /// On failure the buffer holds whatever was written before the failing
    /// value; a primitive run is never written partially.
    pub fn serialize<T: Visit>(&mut self, value: &T) -> Result<(), VisitError> {
        let start = self.buffer.bytes_written();
        engine::visit(value, self)?;
        log::trace!(
            "serialized `{}` into {} bytes",
            core::any::type_name::<T>(),
            self.buffer.bytes_written() - start
        );
        Ok(())
    }

    #[inline]
    pub fn bytes_written(&self) -> usize {
        self.buffer.bytes_written()
    }

    #[inline]
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    #[inline]
    pub fn into_inner(self) -> B {
        self.buffer
    }

    fn write_count(&mut self, count: usize) -> Result<(), VisitError> {
        self.buffer.write_bytes(&(count as u64).to_ne_bytes())
    }
}

/// Returns the size of the count prefix for a sequence of `count` items.
fn prefix_len(count: usize, length: Length) -> Result<usize, FormatError> {
    match length {
        Length::Fixed(expected) if expected != count => Err(FormatError::FixedLength {
            expected,
            found: count,
        }),
        Length::Fixed(_) => Ok(0),
        Length::Prefixed => Ok(COUNT_BYTES),
    }
}

impl<B: WriteBuffer> ConstVisitor for Serializer<B> {
    fn visit_primitive(&mut self, value: Scalar) -> Result<(), VisitError> {
        let mut scratch = [0u8; 8];
        let bytes = value.encode(&mut scratch);
        self.buffer.reserve(bytes.len())?;
        self.buffer.write_bytes(bytes)
    }

    fn visit_primitive_run(&mut self, run: Run<'_>, length: Length) -> Result<(), VisitError> {
        let prefix = prefix_len(run.len(), length)?;
        self.buffer.reserve(prefix + run.byte_len())?;
        if prefix > 0 {
            self.write_count(run.len())?;
        }
        run.encode_chunks(|chunk| self.buffer.write_bytes(chunk))
    }

    #[inline]
    fn visit_element(&mut self) -> Result<(), VisitError> {
        Ok(())
    }

    fn visit_collection(&mut self, count: usize, length: Length) -> Result<(), VisitError> {
        if prefix_len(count, length)? > 0 {
            self.buffer.reserve(COUNT_BYTES)?;
            self.write_count(count)?;
        }
        Ok(())
    }
}
