use core::fmt;

/// A pair of accessors reaching a field `F` inside a `T`.
///
/// Lenses are plain function pointers, so a schema stores no closures and
/// is `Send + Sync` for free. Build them with [`lens!`](crate::lens).
pub struct Lens<T, F> {
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
}

impl<T, F> Lens<T, F> {
    /// Creates a lens from its two accessors.
    #[inline]
    pub const fn new(get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self {
        Self { get, get_mut }
    }

    /// Borrows the field.
    #[inline(always)]
    pub fn get<'a>(&self, target: &'a T) -> &'a F {
        (self.get)(target)
    }

    /// Borrows the field mutably.
    #[inline(always)]
    pub fn get_mut<'a>(&self, target: &'a mut T) -> &'a mut F {
        (self.get_mut)(target)
    }
}

impl<T, F> Clone for Lens<T, F> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, F> Copy for Lens<T, F> {}

impl<T, F> fmt::Debug for Lens<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lens")
            .field("target", &core::any::type_name::<T>())
            .field("field", &core::any::type_name::<F>())
            .finish()
    }
}

/// Builds a [`Lens`] to a (possibly nested) named field.
///
/// # Examples
///
/// ```
/// use vc_visit::lens;
///
/// struct Inner { value: u16 }
/// struct Outer { inner: Inner }
///
/// let lens = lens!(Outer, inner.value);
/// let mut outer = Outer { inner: Inner { value: 7 } };
///
/// assert_eq!(*lens.get(&outer), 7);
/// *lens.get_mut(&mut outer) = 9;
/// assert_eq!(outer.inner.value, 9);
/// ```
#[macro_export]
macro_rules! lens {
    ($ty:ty, $($field:ident).+) => {
        $crate::Lens::<$ty, _>::new(
            |target| &target.$($field).+,
            |target| &mut target.$($field).+,
        )
    };
}
