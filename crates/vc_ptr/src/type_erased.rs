use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

// -----------------------------------------------------------------------------
// Shared helpers

macro_rules! impl_erased {
    ($ptr:ident) => {
        impl $ptr<'_> {
            /// Returns `true` if the address is aligned for `T`.
            #[inline]
            pub fn is_aligned<T>(&self) -> bool {
                self.0.as_ptr().cast::<T>().is_aligned()
            }

            /// Asserts alignment for `T` in debug builds, compiles to nothing otherwise.
            #[cfg_attr(debug_assertions, track_caller)]
            #[cfg_attr(not(debug_assertions), inline(always))]
            pub fn debug_assert_aligned<T>(&self) {
                debug_assert!(
                    self.is_aligned::<T>(),
                    "address {:p} is not aligned to {} for `{}`",
                    self.0,
                    align_of::<T>(),
                    core::any::type_name::<T>(),
                );
            }

            /// Returns the raw address.
            #[inline(always)]
            pub const fn addr(&self) -> NonNull<u8> {
                self.0
            }
        }

        impl fmt::Pointer for $ptr<'_> {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Pointer::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $ptr<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:p})", stringify!($ptr), self.0)
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Ptr

/// A type-erased shared borrow, similar to `&'a dyn Any` without the vtable.
///
/// The pointee is valid and unchanged for `'a`; the lifetime comes from the
/// reference the pointer was built from.
///
/// # Examples
///
/// ```
/// # use vc_ptr::Ptr;
/// let x = 8u16;
/// let ptr = Ptr::from_ref(&x);
///
/// ptr.debug_assert_aligned::<u16>();
/// assert_eq!(unsafe { *ptr.as_ref::<u16>() }, 8);
/// ```
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Ptr<'a>(NonNull<u8>, PhantomData<&'a u8>);

impl_erased!(Ptr);

impl<'a> Ptr<'a> {
    /// Creates a `Ptr` from a raw address.
    ///
    /// # Safety
    ///
    /// - `ptr` points to a valid value of the type it will later be read as.
    /// - That value stays valid and unmodified for `'a`.
    #[inline(always)]
    pub const unsafe fn new(ptr: NonNull<u8>) -> Self {
        Self(ptr, PhantomData)
    }

    /// Erases the type of a shared reference.
    #[inline(always)]
    pub const fn from_ref<T: ?Sized>(value: &'a T) -> Self {
        Self(NonNull::from_ref(value).cast(), PhantomData)
    }

    /// Recovers the typed reference with the full lifetime `'a`.
    ///
    /// # Safety
    ///
    /// - `T` is the type the pointer was created from.
    /// - The address is aligned for `T`.
    #[inline(always)]
    pub const unsafe fn as_ref<T>(self) -> &'a T {
        // SAFETY: type and alignment are guaranteed by the caller.
        unsafe { &*self.0.as_ptr().cast::<T>() }
    }
}

impl<'a, T: ?Sized> From<&'a T> for Ptr<'a> {
    #[inline]
    fn from(value: &'a T) -> Self {
        Self::from_ref(value)
    }
}

// -----------------------------------------------------------------------------
// PtrMut

/// A type-erased exclusive borrow, similar to `&'a mut dyn Any` without the vtable.
///
/// Unlike `&mut T`, a `PtrMut` can be [aliased](PtrMut::alias) so that a
/// parent object can stay reachable while frames for its fields are pending.
/// The caller is then responsible for never holding two live references
/// derived from the same address at once.
///
/// # Examples
///
/// ```
/// # use vc_ptr::PtrMut;
/// let mut x = 8u32;
/// let ptr = PtrMut::from_mut(&mut x);
///
/// let rx = unsafe { ptr.as_mut::<u32>() };
/// *rx += 2;
/// assert_eq!(x, 10);
/// ```
#[repr(transparent)]
pub struct PtrMut<'a>(NonNull<u8>, PhantomData<&'a mut u8>);

impl_erased!(PtrMut);

impl<'a> PtrMut<'a> {
    /// Creates a `PtrMut` from a raw address.
    ///
    /// # Safety
    ///
    /// - `ptr` points to a valid value of the type it will later be read as.
    /// - Nothing else accesses that value for `'a` except through this pointer.
    #[inline(always)]
    pub const unsafe fn new(ptr: NonNull<u8>) -> Self {
        Self(ptr, PhantomData)
    }

    /// Erases the type of an exclusive reference.
    #[inline(always)]
    pub const fn from_mut<T: ?Sized>(value: &'a mut T) -> Self {
        Self(NonNull::from_mut(value).cast(), PhantomData)
    }

    /// Creates a second pointer to the same target with the same lifetime.
    ///
    /// # Safety
    ///
    /// References obtained through the two pointers must never be live at
    /// the same time.
    #[inline(always)]
    pub const unsafe fn alias(&self) -> PtrMut<'a> {
        PtrMut(self.0, PhantomData)
    }

    /// Downgrades to a shared [`Ptr`].
    #[inline(always)]
    pub const fn into_ptr(self) -> Ptr<'a> {
        Ptr(self.0, PhantomData)
    }

    /// Recovers the typed exclusive reference with the full lifetime `'a`.
    ///
    /// # Safety
    ///
    /// - `T` is the type the pointer was created from.
    /// - The address is aligned for `T`.
    /// - No other reference to the target is live while the result is used.
    #[inline(always)]
    pub const unsafe fn as_mut<T>(self) -> &'a mut T {
        // SAFETY: type, alignment and exclusivity are guaranteed by the caller.
        unsafe { &mut *self.0.as_ptr().cast::<T>() }
    }
}

impl<'a, T: ?Sized> From<&'a mut T> for PtrMut<'a> {
    #[inline]
    fn from(value: &'a mut T) -> Self {
        Self::from_mut(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Ptr, PtrMut};

    #[test]
    fn shared_round_trip() {
        let value = [1u16, 2, 3];
        let ptr = Ptr::from_ref(&value);
        assert!(ptr.is_aligned::<[u16; 3]>());
        assert_eq!(unsafe { ptr.as_ref::<[u16; 3]>() }, &[1, 2, 3]);
    }

    #[test]
    fn alias_then_write() {
        let mut value = (1u8, 2u64);
        let ptr = PtrMut::from_mut(&mut value);
        let second = unsafe { ptr.alias() };

        unsafe { ptr.as_mut::<(u8, u64)>().0 = 7 };
        unsafe { second.as_mut::<(u8, u64)>().1 = 9 };
        assert_eq!(value, (7, 9));
    }
}
