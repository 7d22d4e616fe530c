/// An axis-aligned rectangle; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    #[inline]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    #[inline]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Grows `self` to cover `other`.
    pub fn include(&mut self, other: Rect) {
        self.left = self.left.min(other.left);
        self.top = self.top.min(other.top);
        self.right = self.right.max(other.right);
        self.bottom = self.bottom.max(other.bottom);
    }
}

/// An 8-bit grayscale destination for text rendering.
///
/// Rows are `pitch` bytes apart; writes outside `width × height` are
/// dropped.
#[derive(Debug)]
pub struct GrayBuffer<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
    pitch: usize,
}

impl<'a> GrayBuffer<'a> {
    /// Wraps `pixels` as a tightly packed `width × height` image.
    ///
    /// Returns `None` if `pixels` is too small.
    #[inline]
    pub fn new(pixels: &'a mut [u8], width: u32, height: u32) -> Option<Self> {
        Self::with_pitch(pixels, width, height, width as usize)
    }

    /// Wraps `pixels` as a `width × height` image with rows `pitch` bytes apart.
    ///
    /// Returns `None` if `pitch < width` or `pixels` is too small.
    pub fn with_pitch(pixels: &'a mut [u8], width: u32, height: u32, pitch: usize) -> Option<Self> {
        if pitch < width as usize {
            return None;
        }
        let required = match height {
            0 => 0,
            rows => pitch.checked_mul(rows as usize - 1)? + width as usize,
        };
        if pixels.len() < required {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
            pitch,
        })
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub const fn pitch(&self) -> usize {
        self.pitch
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = u32::try_from(y).ok().filter(|&y| y < self.height)?;
        Some(y as usize * self.pitch + x as usize)
    }

    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        self.offset(x, y).map(|offset| self.pixels[offset])
    }

    /// Sets one pixel, ignoring coordinates outside the image.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, value: u8) {
        if let Some(offset) = self.offset(x, y) {
            self.pixels[offset] = value;
        }
    }

    /// Sets every pixel to `value`.
    pub fn fill(&mut self, value: u8) {
        let width = self.width as usize;
        if width == 0 {
            return;
        }
        for row in self.pixels.chunks_mut(self.pitch).take(self.height as usize) {
            row[..width].fill(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GrayBuffer, Rect};

    #[test]
    fn pitch_separates_rows() {
        let mut storage = [0u8; 11];
        let mut buffer = GrayBuffer::with_pitch(&mut storage, 3, 3, 4).unwrap();
        buffer.fill(1);
        buffer.set_pixel(2, 2, 9);
        buffer.set_pixel(-1, 0, 9);
        buffer.set_pixel(3, 0, 9);

        assert_eq!(buffer.pixel(2, 2), Some(9));
        assert_eq!(buffer.pixel(0, 3), None);
        assert_eq!(storage, [1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 9]);
    }

    #[test]
    fn undersized_storage_is_rejected() {
        let mut storage = [0u8; 5];
        assert!(GrayBuffer::new(&mut storage, 3, 2).is_none());
        assert!(GrayBuffer::with_pitch(&mut storage, 3, 1, 2).is_none());
        assert!(GrayBuffer::new(&mut storage, 5, 1).is_some());
    }

    #[test]
    fn rects_grow() {
        let mut rect = Rect::default();
        rect.include(Rect {
            left: 2,
            top: -3,
            right: 5,
            bottom: 1,
        });
        assert_eq!((rect.width(), rect.height()), (5, 4));
    }
}
