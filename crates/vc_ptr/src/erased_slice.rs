use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::{Ptr, PtrMut};

// -----------------------------------------------------------------------------
// ErasedSlice

/// A type-erased `&'a [T]`.
///
/// Stores the base address, the element count and the element stride.
///
/// # Examples
///
/// ```
/// # use vc_ptr::ErasedSlice;
/// let values = [10u32, 20, 30];
/// let slice = ErasedSlice::from_ref(&values[..]);
///
/// assert_eq!(slice.len(), 3);
/// let second = slice.get(1).unwrap();
/// assert_eq!(unsafe { *second.as_ref::<u32>() }, 20);
/// assert!(slice.get(3).is_none());
/// ```
#[derive(Copy, Clone)]
pub struct ErasedSlice<'a> {
    base: NonNull<u8>,
    len: usize,
    stride: usize,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> ErasedSlice<'a> {
    /// Erases the element type of a shared slice.
    #[inline]
    pub const fn from_ref<T>(items: &'a [T]) -> Self {
        Self {
            base: NonNull::from_ref(items).cast(),
            len: items.len(),
            stride: size_of::<T>(),
            _marker: PhantomData,
        }
    }

    /// Number of elements.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the slice has no elements.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of element `index`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Ptr<'a>> {
        if index >= self.len {
            return None;
        }
        // SAFETY: `index < len`, so the offset stays inside the borrowed slice
        // and points at a valid element for `'a`.
        Some(unsafe { Ptr::new(self.base.add(index * self.stride)) })
    }
}

impl fmt::Debug for ErasedSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedSlice")
            .field("base", &self.base)
            .field("len", &self.len)
            .field("stride", &self.stride)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ErasedSliceMut

/// A type-erased `&'a mut [T]`.
///
/// The descriptor itself is `Copy`; exclusivity is enforced per element by
/// [`item`](ErasedSliceMut::item), which hands out one [`PtrMut`] per index.
///
/// # Examples
///
/// ```
/// # use vc_ptr::ErasedSliceMut;
/// let mut values = [1i16, 2, 3];
/// let slice = ErasedSliceMut::from_mut(&mut values[..]);
///
/// for index in 0..slice.len() {
///     let item = unsafe { slice.item(index) };
///     unsafe { *item.as_mut::<i16>() *= -1 };
/// }
/// assert_eq!(values, [-1, -2, -3]);
/// ```
#[derive(Copy, Clone)]
pub struct ErasedSliceMut<'a> {
    base: NonNull<u8>,
    len: usize,
    stride: usize,
    _marker: PhantomData<&'a mut [u8]>,
}

impl<'a> ErasedSliceMut<'a> {
    /// Erases the element type of an exclusive slice.
    #[inline]
    pub const fn from_mut<T>(items: &'a mut [T]) -> Self {
        Self {
            len: items.len(),
            base: NonNull::from_mut(items).cast(),
            stride: size_of::<T>(),
            _marker: PhantomData,
        }
    }

    /// Number of elements.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the slice has no elements.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive address of element `index`.
    ///
    /// # Safety
    ///
    /// - `index < self.len()`.
    /// - Each index is handed out at most once while its pointer is in use.
    #[cfg_attr(debug_assertions, track_caller)]
    #[inline]
    pub unsafe fn item(&self, index: usize) -> PtrMut<'a> {
        debug_assert!(index < self.len, "erased slice index out of bounds");
        // SAFETY: in bounds by contract, exclusive per index by contract.
        unsafe { PtrMut::new(self.base.add(index * self.stride)) }
    }
}

impl fmt::Debug for ErasedSliceMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedSliceMut")
            .field("base", &self.base)
            .field("len", &self.len)
            .field("stride", &self.stride)
            .finish()
    }
}
