use vc_ptr::{Ptr, PtrMut};

use crate::element::Visit;
use crate::engine::{ConstVisitContext, VisitContext};
use crate::error::VisitError;
use crate::schema::Schema;

/// A [`Schema<T>`] with `T` erased, so frames of any type share one stack.
pub(crate) trait ErasedSchema {
    fn type_name(&self) -> &'static str;

    fn len(&self) -> usize;

    fn field_name(&self, index: usize) -> &'static str;

    /// Runs action `index` against `target` in the serializing direction.
    ///
    /// # Safety
    ///
    /// - `target` was created from a `&'a T` of this schema's `T`.
    /// - `index < self.len()`.
    unsafe fn write_field<'a>(
        &self,
        target: Ptr<'a>,
        index: usize,
        ctx: &mut ConstVisitContext<'a, '_>,
    ) -> Result<(), VisitError>;

    /// Runs action `index` against `target` in the deserializing direction.
    ///
    /// # Safety
    ///
    /// - `target` was created from a `&'a mut T` of this schema's `T`.
    /// - No reference previously derived from `target` is used again.
    /// - `index < self.len()`.
    unsafe fn read_field<'a>(
        &self,
        target: PtrMut<'a>,
        index: usize,
        ctx: &mut VisitContext<'a, '_>,
    ) -> Result<(), VisitError>;
}

impl<T: Visit> ErasedSchema for Schema<T> {
    #[inline]
    fn type_name(&self) -> &'static str {
        Schema::type_name(self)
    }

    #[inline]
    fn len(&self) -> usize {
        Schema::len(self)
    }

    fn field_name(&self, index: usize) -> &'static str {
        self.fields().get(index).map_or("<end>", |field| field.name())
    }

    #[inline]
    unsafe fn write_field<'a>(
        &self,
        target: Ptr<'a>,
        index: usize,
        ctx: &mut ConstVisitContext<'a, '_>,
    ) -> Result<(), VisitError> {
        target.debug_assert_aligned::<T>();
        // SAFETY: the caller guarantees `target` is a live `&'a T`.
        let value = unsafe { target.as_ref::<T>() };
        self.fields()[index].ops().write(value, ctx)
    }

    #[inline]
    unsafe fn read_field<'a>(
        &self,
        target: PtrMut<'a>,
        index: usize,
        ctx: &mut VisitContext<'a, '_>,
    ) -> Result<(), VisitError> {
        target.debug_assert_aligned::<T>();
        // SAFETY: the caller guarantees `target` is a live `&'a mut T` with
        // no other reference to it in use.
        let value = unsafe { target.as_mut::<T>() };
        self.fields()[index].ops().read(value, ctx)
    }
}
