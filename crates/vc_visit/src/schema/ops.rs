//! Field-action implementations.
//!
//! Every action kind is one [`FieldOps`] implementation. Collections share
//! [`SequenceOps`]; what differs between a fixed array, a vector, a counted
//! heap blob and a getter/resizer pair is only the [`Slots`] strategy that
//! reports the current elements and resizes the destination.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::marker::PhantomData;
use core::{mem, slice};

use crate::element::Element;
use crate::engine::{ConstVisitContext, VisitContext};
use crate::error::{FormatError, VisitError};
use crate::primitive::{Primitive, PrimitiveType, Run, RunMut};
use crate::schema::Lens;
use crate::serde::{ElementView, OptionView, SliceView};
use crate::visitor::{ConstVisitor, Length, RunBuffer, Visitor};

/// Boxed serde view of one field, borrowed from the visited value.
pub(crate) type FieldView<'a> = Box<dyn erased_serde::Serialize + 'a>;

/// Read and write behavior of one schema slot.
pub(crate) trait FieldOps<T>: Send + Sync {
    fn write<'a>(&self, target: &'a T, ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError>;

    fn read<'a>(&self, target: &'a mut T, ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError>;

    /// `None` for slots that carry no inspectable value.
    fn inspect<'a>(&self, target: &'a T) -> Option<FieldView<'a>>;
}

// -----------------------------------------------------------------------------
// Member

pub(crate) struct MemberOps<T, F> {
    pub lens: Lens<T, F>,
}

impl<T: 'static, F: Element> FieldOps<T> for MemberOps<T, F> {
    #[inline]
    fn write<'a>(&self, target: &'a T, ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError> {
        self.lens.get(target).write_one(ctx)
    }

    #[inline]
    fn read<'a>(&self, target: &'a mut T, ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError> {
        self.lens.get_mut(target).read_one(ctx)
    }

    fn inspect<'a>(&self, target: &'a T) -> Option<FieldView<'a>> {
        Some(Box::new(ElementView(self.lens.get(target))))
    }
}

// -----------------------------------------------------------------------------
// Sequences

/// Element storage behind a collection field.
pub(crate) trait Slots<T, F>: Send + Sync {
    fn items<'a>(&self, target: &'a T) -> &'a [F];

    /// Makes the destination hold exactly `count` elements.
    fn resize<'a>(&self, target: &'a mut T, count: usize) -> Result<&'a mut [F], VisitError>;
}

pub(crate) struct SequenceOps<T, F, S> {
    pub slots: S,
    pub length: Length,
    pub _marker: PhantomData<fn(&T, &F)>,
}

impl<T, F, S> FieldOps<T> for SequenceOps<T, F, S>
where
    T: 'static,
    F: Element,
    S: Slots<T, F>,
{
    fn write<'a>(&self, target: &'a T, ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError> {
        F::write_many(self.slots.items(target), self.length, ctx)
    }

    fn read<'a>(&self, target: &'a mut T, ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError> {
        F::read_many(
            self.length,
            move |count| {
                let target = target;
                self.slots.resize(target, count)
            },
            ctx,
        )
    }

    fn inspect<'a>(&self, target: &'a T) -> Option<FieldView<'a>> {
        Some(Box::new(SliceView(self.slots.items(target))))
    }
}

/// Vector-like storage with a fallible, exact reservation.
fn resize_vec<F: Default>(items: &mut Vec<F>, count: usize) -> Result<(), VisitError> {
    items.clear();
    items
        .try_reserve_exact(count)
        .map_err(|_| VisitError::Allocation { count })?;
    items.resize_with(count, F::default);
    Ok(())
}

pub(crate) struct ArraySlots<T, F, const N: usize> {
    pub lens: Lens<T, [F; N]>,
}

impl<T, F: Element, const N: usize> Slots<T, F> for ArraySlots<T, F, N> {
    #[inline]
    fn items<'a>(&self, target: &'a T) -> &'a [F] {
        self.lens.get(target)
    }

    fn resize<'a>(&self, target: &'a mut T, count: usize) -> Result<&'a mut [F], VisitError> {
        if count != N {
            return Err(FormatError::FixedLength {
                expected: N,
                found: count,
            }
            .into());
        }
        Ok(&mut self.lens.get_mut(target)[..])
    }
}

pub(crate) struct VecSlots<T, F> {
    pub lens: Lens<T, Vec<F>>,
}

impl<T, F: Element> Slots<T, F> for VecSlots<T, F> {
    #[inline]
    fn items<'a>(&self, target: &'a T) -> &'a [F] {
        self.lens.get(target)
    }

    fn resize<'a>(&self, target: &'a mut T, count: usize) -> Result<&'a mut [F], VisitError> {
        let items = self.lens.get_mut(target);
        resize_vec(items, count)?;
        Ok(items.as_mut_slice())
    }
}

/// A heap blob paired with a separate count field.
///
/// The blob's own length is what gets written; the count field is
/// rewritten on read.
pub(crate) struct CountedSlots<T, F, C> {
    pub data: Lens<T, Box<[F]>>,
    pub count: Lens<T, C>,
}

impl<T, F, C> Slots<T, F> for CountedSlots<T, F, C>
where
    F: Element,
    C: Primitive + TryFrom<usize>,
{
    #[inline]
    fn items<'a>(&self, target: &'a T) -> &'a [F] {
        self.data.get(target)
    }

    fn resize<'a>(&self, target: &'a mut T, count: usize) -> Result<&'a mut [F], VisitError> {
        let stored = C::try_from(count).map_err(|_| FormatError::CountOverflow(count as u64))?;
        let mut items = Vec::new();
        resize_vec(&mut items, count)?;

        *self.count.get_mut(target) = stored;
        let data = self.data.get_mut(target);
        *data = items.into_boxed_slice();
        Ok(&mut data[..])
    }
}

pub(crate) struct FnSlots<T, F> {
    pub get: fn(&T) -> &[F],
    pub resize: fn(&mut T, usize) -> Result<&mut [F], VisitError>,
}

impl<T, F: Element> Slots<T, F> for FnSlots<T, F> {
    #[inline]
    fn items<'a>(&self, target: &'a T) -> &'a [F] {
        (self.get)(target)
    }

    fn resize<'a>(&self, target: &'a mut T, count: usize) -> Result<&'a mut [F], VisitError> {
        let items = (self.resize)(target, count)?;
        if items.len() != count {
            return Err(FormatError::CountMismatch {
                max: items.len(),
                found: count,
            }
            .into());
        }
        Ok(items)
    }
}

// -----------------------------------------------------------------------------
// Optional

pub(crate) struct OptionalOps<T, F> {
    pub lens: Lens<T, Option<Box<F>>>,
}

impl<T: 'static, F: Element> FieldOps<T> for OptionalOps<T, F> {
    fn write<'a>(&self, target: &'a T, ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError> {
        let items: &[F] = match self.lens.get(target) {
            Some(value) => slice::from_ref(&**value),
            None => &[],
        };
        F::write_many(items, Length::Prefixed, ctx)
    }

    fn read<'a>(&self, target: &'a mut T, ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError> {
        let slot = self.lens.get_mut(target);
        F::read_many(
            Length::Prefixed,
            move |count| {
                let slot = slot;
                match count {
                    0 => {
                        *slot = None;
                        Ok(<&mut [F]>::default())
                    }
                    1 => Ok(slice::from_mut(&mut **slot.insert(Box::default()))),
                    found => Err(FormatError::CountMismatch { max: 1, found }.into()),
                }
            },
            ctx,
        )
    }

    fn inspect<'a>(&self, target: &'a T) -> Option<FieldView<'a>> {
        Some(Box::new(OptionView(self.lens.get(target).as_deref())))
    }
}

// -----------------------------------------------------------------------------
// Text

pub(crate) struct TextOps<T> {
    pub lens: Lens<T, String>,
}

/// Decodes into the byte buffer of a string being rebuilt.
struct TextRun<'s> {
    bytes: &'s mut Vec<u8>,
}

impl RunBuffer for TextRun<'_> {
    #[inline]
    fn length(&self) -> Length {
        Length::Prefixed
    }

    #[inline]
    fn primitive_type(&self) -> PrimitiveType {
        PrimitiveType::U8
    }

    fn resize(&mut self, count: usize) -> Result<RunMut<'_>, VisitError> {
        resize_vec(self.bytes, count)?;
        Ok(RunMut::U8(self.bytes.as_mut_slice()))
    }
}

/// Emits `text` the way a text field is encoded.
///
/// Meant for [`Schema::direct`](crate::Schema::direct) hooks that persist
/// computed strings.
pub fn write_text(visitor: &mut dyn ConstVisitor, text: &str) -> Result<(), VisitError> {
    visitor.visit_primitive_run(Run::U8(text.as_bytes()), Length::Prefixed)
}

/// Replaces `text` with a string decoded the way a text field is encoded.
///
/// Fails with [`FormatError::InvalidText`] on malformed UTF-8, leaving
/// `text` empty.
pub fn read_text(visitor: &mut dyn Visitor, text: &mut String) -> Result<(), VisitError> {
    let mut bytes = mem::take(text).into_bytes();
    visitor.visit_primitive_run(&mut TextRun { bytes: &mut bytes })?;
    *text = String::from_utf8(bytes).map_err(|_| FormatError::InvalidText)?;
    Ok(())
}

impl<T: 'static> FieldOps<T> for TextOps<T> {
    fn write<'a>(&self, target: &'a T, ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError> {
        write_text(ctx.visitor(), self.lens.get(target))
    }

    fn read<'a>(&self, target: &'a mut T, ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError> {
        read_text(ctx.visitor(), self.lens.get_mut(target))
    }

    fn inspect<'a>(&self, target: &'a T) -> Option<FieldView<'a>> {
        Some(Box::new(self.lens.get(target).as_str()))
    }
}

// -----------------------------------------------------------------------------
// Getter / setter

pub(crate) struct GetterSetterOps<T, F> {
    pub get: fn(&T) -> F,
    pub set: fn(&mut T, F) -> Result<(), VisitError>,
}

impl<T: 'static, F: Primitive> FieldOps<T> for GetterSetterOps<T, F> {
    #[inline]
    fn write<'a>(&self, target: &'a T, ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError> {
        ctx.visitor().visit_primitive((self.get)(target).into_scalar())
    }

    fn read<'a>(&self, target: &'a mut T, ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError> {
        let mut value = F::default();
        ctx.visitor().visit_primitive(value.as_scalar_mut())?;
        (self.set)(target, value)
    }

    fn inspect<'a>(&self, target: &'a T) -> Option<FieldView<'a>> {
        Some(Box::new((self.get)(target)))
    }
}

// -----------------------------------------------------------------------------
// Direct

pub(crate) struct DirectOps<T> {
    pub on_write: fn(&T, &mut dyn ConstVisitor) -> Result<(), VisitError>,
    pub on_read: fn(&mut T, &mut dyn Visitor) -> Result<(), VisitError>,
}

impl<T: 'static> FieldOps<T> for DirectOps<T> {
    #[inline]
    fn write<'a>(&self, target: &'a T, ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError> {
        (self.on_write)(target, ctx.visitor())
    }

    #[inline]
    fn read<'a>(&self, target: &'a mut T, ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError> {
        (self.on_read)(target, ctx.visitor())
    }

    #[inline]
    fn inspect<'a>(&self, _target: &'a T) -> Option<FieldView<'a>> {
        None
    }
}

pub(crate) struct ReadHookOps<T> {
    pub hook: fn(&mut T) -> Result<(), VisitError>,
}

impl<T: 'static> FieldOps<T> for ReadHookOps<T> {
    #[inline]
    fn write<'a>(&self, _target: &'a T, _ctx: &mut ConstVisitContext<'a, '_>) -> Result<(), VisitError> {
        Ok(())
    }

    #[inline]
    fn read<'a>(&self, target: &'a mut T, _ctx: &mut VisitContext<'a, '_>) -> Result<(), VisitError> {
        (self.hook)(target)
    }

    #[inline]
    fn inspect<'a>(&self, _target: &'a T) -> Option<FieldView<'a>> {
        None
    }
}
