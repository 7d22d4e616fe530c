use crate::backend::ReadBuffer;
use crate::backend::serializer::COUNT_BYTES;
use crate::element::Visit;
use crate::engine;
use crate::error::{CapacityError, FormatError, VisitError};
use crate::primitive::ScalarMut;
use crate::visitor::{EncodedSize, Length, RunBuffer, Visitor};

/// Limits applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeserializeOptions {
    /// Largest collection count accepted before any storage is allocated.
    ///
    /// Larger counts fail with [`VisitError::Allocation`].
    pub max_collection_len: usize,
}

impl DeserializeOptions {
    pub const DEFAULT_MAX_COLLECTION_LEN: usize = 1 << 28;
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            max_collection_len: Self::DEFAULT_MAX_COLLECTION_LEN,
        }
    }
}

/// Decodes objects from the binary format written by
/// [`Serializer`](super::Serializer).
#[derive(Debug)]
pub struct Deserializer<B> {
    buffer: B,
    options: DeserializeOptions,
}

impl<B: ReadBuffer> Deserializer<B> {
    #[inline]
    pub fn new(buffer: B) -> Self {
        Self::with_options(buffer, DeserializeOptions::default())
    }

    #[inline]
    pub const fn with_options(buffer: B, options: DeserializeOptions) -> Self {
        Self { buffer, options }
    }

    /// Overwrites the persisted fields of `value` with decoded data.
    ///
    /// On failure, fields decoded before the error keep their new values.
    pub fn deserialize<T: Visit>(&mut self, value: &mut T) -> Result<(), VisitError> {
        let start = self.buffer.bytes_read();
        engine::visit_mut(value, self)?;
        log::trace!(
            "deserialized `{}` from {} bytes",
            core::any::type_name::<T>(),
            self.buffer.bytes_read() - start
        );
        Ok(())
    }

    /// Decodes a fresh `T`.
    pub fn deserialize_new<T: Visit>(&mut self) -> Result<T, VisitError> {
        let mut value = T::default();
        self.deserialize(&mut value)?;
        Ok(value)
    }

    #[inline]
    pub fn bytes_read(&self) -> usize {
        self.buffer.bytes_read()
    }

    #[inline]
    pub fn options(&self) -> DeserializeOptions {
        self.options
    }

    #[inline]
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    #[inline]
    pub fn into_inner(self) -> B {
        self.buffer
    }

    fn read_count(&mut self) -> Result<usize, VisitError> {
        let mut bytes = [0u8; COUNT_BYTES];
        self.buffer.read_bytes(&mut bytes)?;
        let raw = u64::from_ne_bytes(bytes);
        let count = usize::try_from(raw).map_err(|_| FormatError::CountOverflow(raw))?;
        if count > self.options.max_collection_len {
            log::debug!(
                "collection count {count} exceeds the limit of {}",
                self.options.max_collection_len
            );
            return Err(VisitError::Allocation { count });
        }
        Ok(count)
    }

    /// Fails if a bounded source holds fewer than `required` bytes.
    fn ensure_remaining(&self, required: usize) -> Result<(), VisitError> {
        match self.buffer.remaining() {
            Some(remaining) if required > remaining => Err(CapacityError::Underflow {
                required,
                remaining,
            }
            .into()),
            _ => Ok(()),
        }
    }

    fn read_length(&mut self, length: Length) -> Result<usize, VisitError> {
        match length {
            Length::Fixed(count) => Ok(count),
            Length::Prefixed => self.read_count(),
        }
    }
}

impl<B: ReadBuffer> Visitor for Deserializer<B> {
    fn visit_primitive(&mut self, mut slot: ScalarMut<'_>) -> Result<(), VisitError> {
        let width = slot.primitive_type().width();
        let mut scratch = [0u8; 8];
        self.buffer.read_bytes(&mut scratch[..width])?;
        slot.decode(&scratch);
        Ok(())
    }

    fn visit_primitive_run(&mut self, buffer: &mut dyn RunBuffer) -> Result<(), VisitError> {
        let count = self.read_length(buffer.length())?;
        self.ensure_remaining(count.saturating_mul(buffer.primitive_type().width()))?;

        let mut items = buffer.resize(count)?;
        items.decode_chunks(|chunk| self.buffer.read_bytes(chunk))
    }

    #[inline]
    fn visit_element(&mut self) -> Result<(), VisitError> {
        Ok(())
    }

    fn visit_collection(&mut self, length: Length) -> Result<usize, VisitError> {
        self.read_length(length)
    }

    fn reserve_collection(&mut self, count: usize, element: EncodedSize) -> Result<(), VisitError> {
        self.ensure_remaining(count.saturating_mul(element.bytes(COUNT_BYTES)))
    }
}
