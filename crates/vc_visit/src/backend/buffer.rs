use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use std::io;

use crate::error::{CapacityError, VisitError};

// -----------------------------------------------------------------------------
// Traits

/// Destination of a [`Serializer`](super::Serializer).
pub trait WriteBuffer {
    /// Total bytes accepted so far.
    fn bytes_written(&self) -> usize;

    /// Fails unless `additional` more bytes can be written.
    ///
    /// A failed reservation leaves the buffer untouched.
    fn reserve(&mut self, additional: usize) -> Result<(), VisitError>;

    /// Appends `bytes`.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), VisitError>;
}

/// Source of a [`Deserializer`](super::Deserializer).
pub trait ReadBuffer {
    /// Total bytes consumed so far.
    fn bytes_read(&self) -> usize;

    /// Bytes left, if the source knows its length.
    fn remaining(&self) -> Option<usize>;

    /// Fills the whole of `out`.
    ///
    /// Running out of input fails with [`CapacityError::Underflow`].
    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), VisitError>;
}

// -----------------------------------------------------------------------------
// Slices

/// Writes into a caller-provided byte slice.
#[derive(Debug)]
pub struct SliceWriter<'a> {
    bytes: &'a mut [u8],
    cursor: usize,
}

impl<'a> SliceWriter<'a> {
    #[inline]
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    /// The written prefix of the slice.
    #[inline]
    pub fn written(&self) -> &[u8] {
        &self.bytes[..self.cursor]
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }
}

impl WriteBuffer for SliceWriter<'_> {
    #[inline]
    fn bytes_written(&self) -> usize {
        self.cursor
    }

    fn reserve(&mut self, additional: usize) -> Result<(), VisitError> {
        let remaining = self.remaining();
        if additional > remaining {
            return Err(CapacityError::Overflow {
                required: additional,
                remaining,
            }
            .into());
        }
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), VisitError> {
        self.reserve(bytes.len())?;
        let end = self.cursor + bytes.len();
        self.bytes[self.cursor..end].copy_from_slice(bytes);
        self.cursor = end;
        Ok(())
    }
}

/// Reads from a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> SliceReader<'a> {
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    /// The bytes not consumed yet.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.cursor..]
    }
}

impl ReadBuffer for SliceReader<'_> {
    #[inline]
    fn bytes_read(&self) -> usize {
        self.cursor
    }

    #[inline]
    fn remaining(&self) -> Option<usize> {
        Some(self.bytes.len() - self.cursor)
    }

    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), VisitError> {
        let rest = self.rest();
        let Some(source) = rest.get(..out.len()) else {
            return Err(CapacityError::Underflow {
                required: out.len(),
                remaining: rest.len(),
            }
            .into());
        };
        out.copy_from_slice(source);
        self.cursor += out.len();
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Vec

/// Appends to an owned, growable vector.
#[derive(Debug, Default)]
pub struct VecWriter {
    bytes: Vec<u8>,
}

impl VecWriter {
    #[inline]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Appends after the existing contents of `bytes`.
    #[inline]
    pub const fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

impl WriteBuffer for VecWriter {
    #[inline]
    fn bytes_written(&self) -> usize {
        self.bytes.len()
    }

    fn reserve(&mut self, additional: usize) -> Result<(), VisitError> {
        self.bytes
            .try_reserve(additional)
            .map_err(|_: TryReserveError| VisitError::Allocation { count: additional })
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), VisitError> {
        self.reserve(bytes.len())?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Streams

/// Writes through to an [`io::Write`].
///
/// Reservations always succeed; stream failures surface on write.
#[derive(Debug)]
pub struct StreamWriter<W> {
    inner: W,
    written: usize,
}

impl<W: io::Write> StreamWriter<W> {
    #[inline]
    pub const fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Flushes and returns the wrapped writer.
    pub fn into_inner(mut self) -> Result<W, VisitError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: io::Write> WriteBuffer for StreamWriter<W> {
    #[inline]
    fn bytes_written(&self) -> usize {
        self.written
    }

    #[inline]
    fn reserve(&mut self, _additional: usize) -> Result<(), VisitError> {
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), VisitError> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }
}

/// Reads from an [`io::Read`] of unknown length.
#[derive(Debug)]
pub struct StreamReader<R> {
    inner: R,
    read: usize,
}

impl<R: io::Read> StreamReader<R> {
    #[inline]
    pub const fn new(inner: R) -> Self {
        Self { inner, read: 0 }
    }

    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: io::Read> ReadBuffer for StreamReader<R> {
    #[inline]
    fn bytes_read(&self) -> usize {
        self.read
    }

    #[inline]
    fn remaining(&self) -> Option<usize> {
        None
    }

    fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), VisitError> {
        match self.inner.read_exact(out) {
            Ok(()) => {
                self.read += out.len();
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                Err(CapacityError::Underflow {
                    required: out.len(),
                    remaining: 0,
                }
                .into())
            }
            Err(err) => Err(err.into()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ReadBuffer, SliceReader, SliceWriter, StreamReader, VecWriter, WriteBuffer};
    use crate::{CapacityError, VisitError};

    #[test]
    fn slice_writer_rejects_without_writing() {
        let mut storage = [0u8; 4];
        let mut writer = SliceWriter::new(&mut storage);
        writer.write_bytes(&[1, 2, 3]).unwrap();

        let err = writer.write_bytes(&[4, 5]).unwrap_err();
        assert!(matches!(
            err,
            VisitError::Capacity(CapacityError::Overflow {
                required: 2,
                remaining: 1
            })
        ));
        assert_eq!(writer.written(), [1, 2, 3]);
        assert_eq!(storage, [1, 2, 3, 0]);
    }

    #[test]
    fn slice_reader_reports_underflow() {
        let mut reader = SliceReader::new(&[7, 8, 9]);
        let mut pair = [0u8; 2];
        reader.read_bytes(&mut pair).unwrap();
        assert_eq!(pair, [7, 8]);

        let err = reader.read_bytes(&mut pair).unwrap_err();
        assert!(matches!(
            err,
            VisitError::Capacity(CapacityError::Underflow {
                required: 2,
                remaining: 1
            })
        ));
        assert_eq!(reader.bytes_read(), 2);
        assert_eq!(reader.remaining(), Some(1));
    }

    #[test]
    fn vec_writer_grows() {
        let mut writer = VecWriter::new();
        writer.write_bytes(&[1; 300]).unwrap();
        writer.write_bytes(&[2]).unwrap();
        assert_eq!(writer.bytes_written(), 301);
        assert_eq!(writer.into_inner()[300], 2);
    }

    #[test]
    fn stream_reader_maps_eof() {
        let mut reader = StreamReader::new(&[1u8, 2][..]);
        let mut out = [0u8; 3];
        let err = reader.read_bytes(&mut out).unwrap_err();
        assert!(err.is_capacity());
        assert_eq!(reader.remaining(), None);
    }
}
