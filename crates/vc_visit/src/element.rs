use crate::engine::{ConstVisitContext, VisitContext};
use crate::error::VisitError;
use crate::primitive::{Primitive, PrimitiveType};
use crate::schema::{Schema, schema_of};
use crate::serde::SchemaSerializer;
use crate::visitor::{EncodedSize, Length, RunBuffer};

// -----------------------------------------------------------------------------
// Visit

/// A composite type with a schema.
///
/// The schema is built once, on first use, and cached for the life of the
/// process; see [`schema_of`](crate::schema_of).
///
/// # Examples
///
/// ```
/// use vc_visit::{Schema, Visit, lens};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Visit for Point {
///     fn build_schema() -> Schema<Self> {
///         Schema::new()
///             .member("x", lens!(Point, x))
///             .member("y", lens!(Point, y))
///     }
/// }
///
/// let bytes = vc_visit::serialize_to_vec(&Point { x: 3, y: -4 }).unwrap();
/// assert_eq!(bytes.len(), 8);
///
/// let back: Point = vc_visit::from_slice(&bytes).unwrap();
/// assert_eq!(back, Point { x: 3, y: -4 });
/// ```
pub trait Visit: Default + Send + Sync + 'static {
    /// Describes the fields of `Self`, in wire order.
    fn build_schema() -> Schema<Self>;
}

// -----------------------------------------------------------------------------
// Element

/// Anything that can be a field or a collection element.
///
/// Implemented for every [`Primitive`] and every [`Visit`] type. The
/// methods are the dispatch points the field actions use to tell the two
/// apart: primitives go straight to the visitor, composites are pushed as
/// new traversal frames.
pub trait Element: Default + Send + Sync + 'static {
    /// `Some` for primitives.
    const PRIMITIVE: Option<PrimitiveType>;

    /// What one element always occupies on the wire.
    fn encoded_size() -> EncodedSize;

    #[doc(hidden)]
    fn write_one<'a>(&'a self, ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError>;

    #[doc(hidden)]
    fn read_one<'a>(&'a mut self, ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError>;

    #[doc(hidden)]
    fn write_many<'a>(
        items: &'a [Self],
        length: Length,
        ctx: &mut ConstVisitContext<'a, '_>,
    ) -> Result<(), VisitError>;

    /// `resize` is called once with the decoded count and returns the slots to fill.
    #[doc(hidden)]
    fn read_many<'a, R>(
        length: Length,
        resize: R,
        ctx: &mut VisitContext<'a, '_>,
    ) -> Result<(), VisitError>
    where
        R: FnOnce(usize) -> Result<&'a mut [Self], VisitError>;

    #[doc(hidden)]
    fn inspect<S: serde_core::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>;
}

impl<T: Visit> Element for T {
    const PRIMITIVE: Option<PrimitiveType> = None;

    #[inline]
    fn encoded_size() -> EncodedSize {
        schema_of::<T>().encoded_size()
    }

    #[inline]
    fn write_one<'a>(&'a self, ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError> {
        ctx.enter(self)
    }

    #[inline]
    fn read_one<'a>(&'a mut self, ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError> {
        ctx.enter(self)
    }

    fn write_many<'a>(
        items: &'a [Self],
        length: Length,
        ctx: &mut ConstVisitContext<'a, '_>,
    ) -> Result<(), VisitError> {
        ctx.visitor().visit_collection(items.len(), length)?;
        ctx.push_elements(items);
        Ok(())
    }

    fn read_many<'a, R>(
        length: Length,
        resize: R,
        ctx: &mut VisitContext<'a, '_>,
    ) -> Result<(), VisitError>
    where
        R: FnOnce(usize) -> Result<&'a mut [Self], VisitError>,
    {
        let count = ctx.visitor().visit_collection(length)?;
        ctx.visitor().reserve_collection(count, Self::encoded_size())?;
        let items = resize(count)?;
        ctx.push_elements(items);
        Ok(())
    }

    fn inspect<S: serde_core::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_core::Serialize::serialize(&SchemaSerializer::new(self), serializer)
    }
}

macro_rules! impl_primitive_element {
    ($($ty:ty),*) => {$(
        impl Element for $ty {
            const PRIMITIVE: Option<PrimitiveType> = Some(<$ty as Primitive>::TYPE);

            #[inline]
            fn encoded_size() -> EncodedSize {
                EncodedSize::new(<$ty as Primitive>::TYPE.width(), 0)
            }

            #[inline]
            fn write_one<'a>(&'a self, ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError> {
                ctx.visitor().visit_primitive(self.into_scalar())
            }

            #[inline]
            fn read_one<'a>(&'a mut self, ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError> {
                ctx.visitor().visit_primitive(self.as_scalar_mut())
            }

            #[inline]
            fn write_many<'a>(
                items: &'a [Self],
                length: Length,
                ctx: &mut ConstVisitContext<'a, '_>,
            ) -> Result<(), VisitError> {
                ctx.visitor().visit_primitive_run(<$ty>::as_run(items), length)
            }

            fn read_many<'a, R>(
                length: Length,
                resize: R,
                ctx: &mut VisitContext<'a, '_>,
            ) -> Result<(), VisitError>
            where
                R: FnOnce(usize) -> Result<&'a mut [Self], VisitError>,
            {
                let mut buffer = ResizeRun {
                    length,
                    resize: Some(resize),
                    items: None,
                };
                ctx.visitor().visit_primitive_run(&mut buffer)
            }

            #[inline]
            fn inspect<S: serde_core::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serde_core::Serialize::serialize(self, serializer)
            }
        }
    )*};
}

impl_primitive_element!(i8, u8, i16, u16, i32, u32, i64, u64);

// -----------------------------------------------------------------------------
// ResizeRun

/// Adapts a one-shot resize callback to [`RunBuffer`].
struct ResizeRun<'a, F, R> {
    length: Length,
    resize: Option<R>,
    items: Option<&'a mut [F]>,
}

impl<'a, F, R> RunBuffer for ResizeRun<'a, F, R>
where
    F: Primitive,
    R: FnOnce(usize) -> Result<&'a mut [F], VisitError>,
{
    #[inline]
    fn length(&self) -> Length {
        self.length
    }

    #[inline]
    fn primitive_type(&self) -> PrimitiveType {
        F::TYPE
    }

    fn resize(&mut self, count: usize) -> Result<crate::RunMut<'_>, VisitError> {
        if let Some(resize) = self.resize.take() {
            self.items = Some(resize(count)?);
        }
        // A second call must agree with the first one.
        match self.items.as_deref_mut() {
            Some(items) if items.len() == count => Ok(F::as_run_mut(items)),
            Some(items) => Err(crate::FormatError::CountMismatch {
                max: items.len(),
                found: count,
            }
            .into()),
            None => Err(crate::FormatError::CountMismatch { max: 0, found: count }.into()),
        }
    }
}
