//! The traversal engine.
//!
//! Objects are walked with an explicit stack of frames instead of native
//! recursion, so nesting depth is bounded by heap memory rather than by the
//! thread's stack. A frame is either the remaining fields of one composite
//! or the remaining items of one collection.
//!
//! Each step pops the top frame, pushes its successor (the next field or
//! item), then executes the popped slot. Executing may push frames for a
//! nested composite or collection, which land above the successor and are
//! therefore finished first. The resulting order is a pre-order depth-first
//! walk, identical to what a recursive implementation would produce.
#![expect(unsafe_code, reason = "Traversal frames hold type-erased pointers.")]

mod erased;

use alloc::vec::Vec;

use vc_ptr::{ErasedSlice, ErasedSliceMut, Ptr, PtrMut};

use crate::element::Visit;
use crate::error::VisitError;
use crate::schema::schema_of;
use crate::visitor::{ConstVisitor, Visitor};

use erased::ErasedSchema;

// -----------------------------------------------------------------------------
// Frames

#[derive(Clone, Copy)]
enum ConstFrame<'a> {
    Fields {
        target: Ptr<'a>,
        schema: &'static dyn ErasedSchema,
        index: usize,
    },
    Elements {
        items: ErasedSlice<'a>,
        schema: &'static dyn ErasedSchema,
        index: usize,
    },
}

enum Frame<'a> {
    Fields {
        target: PtrMut<'a>,
        schema: &'static dyn ErasedSchema,
        index: usize,
    },
    Elements {
        items: ErasedSliceMut<'a>,
        schema: &'static dyn ErasedSchema,
        index: usize,
    },
}

fn log_abort(schema: &dyn ErasedSchema, index: usize, err: &VisitError) {
    log::debug!(
        "traversal aborted at `{}::{}`: {err}",
        schema.type_name(),
        schema.field_name(index),
    );
}

// -----------------------------------------------------------------------------
// ConstVisitContext

/// Drives a [`ConstVisitor`] over an object graph borrowed for `'a`.
///
/// Field actions receive the context while the walk is in progress and use
/// it to reach the visitor or to schedule nested composites.
pub struct ConstVisitContext<'a, 'v> {
    visitor: &'v mut dyn ConstVisitor,
    stack: Vec<ConstFrame<'a>>,
    peak: usize,
}

impl<'a, 'v> ConstVisitContext<'a, 'v> {
    /// Creates a context with an empty frame stack.
    pub fn new(visitor: &'v mut dyn ConstVisitor) -> Self {
        Self {
            visitor,
            stack: Vec::new(),
            peak: 0,
        }
    }

    /// The visitor receiving values.
    #[inline(always)]
    pub fn visitor(&mut self) -> &mut (dyn ConstVisitor + 'v) {
        &mut *self.visitor
    }

    /// Largest number of frames pending at once so far.
    #[inline]
    pub fn peak_depth(&self) -> usize {
        self.peak
    }

    #[inline]
    fn push_frame(&mut self, frame: ConstFrame<'a>) {
        self.stack.push(frame);
        self.peak = self.peak.max(self.stack.len());
    }

    /// Schedules the fields of `value`.
    ///
    /// Nothing is emitted until [`run`](Self::run) reaches the frame.
    pub fn push<T: Visit>(&mut self, value: &'a T) {
        let schema = schema_of::<T>();
        if schema.len() > 0 {
            self.push_frame(ConstFrame::Fields {
                target: Ptr::from_ref(value),
                schema,
                index: 0,
            });
        }
    }

    /// Marks the start of a composite, then schedules its fields.
    pub fn enter<T: Visit>(&mut self, value: &'a T) -> Result<(), VisitError> {
        self.visitor.visit_element()?;
        self.push(value);
        Ok(())
    }

    /// Schedules each composite of `items` in order.
    pub fn push_elements<T: Visit>(&mut self, items: &'a [T]) {
        if !items.is_empty() {
            self.push_frame(ConstFrame::Elements {
                items: ErasedSlice::from_ref(items),
                schema: schema_of::<T>(),
                index: 0,
            });
        }
    }

    /// Executes frames until the stack is empty or an action fails.
    ///
    /// On failure the remaining frames are dropped and the error returned
    /// unchanged.
    pub fn run(&mut self) -> Result<(), VisitError> {
        while let Some(frame) = self.stack.pop() {
            if let Err(err) = self.step(frame) {
                self.stack.clear();
                return Err(err);
            }
        }
        Ok(())
    }

    fn step(&mut self, frame: ConstFrame<'a>) -> Result<(), VisitError> {
        match frame {
            ConstFrame::Fields {
                target,
                schema,
                index,
            } => {
                if index >= schema.len() {
                    return Ok(());
                }
                if index + 1 < schema.len() {
                    self.push_frame(ConstFrame::Fields {
                        target,
                        schema,
                        index: index + 1,
                    });
                }
                // SAFETY: `target` was erased from a `&'a T` where `T` owns
                // `schema`, and `index` is in bounds.
                unsafe { schema.write_field(target, index, self) }
                    .inspect_err(|err| log_abort(schema, index, err))
            }
            ConstFrame::Elements {
                items,
                schema,
                index,
            } => {
                let Some(item) = items.get(index) else {
                    return Ok(());
                };
                if index + 1 < items.len() {
                    self.push_frame(ConstFrame::Elements {
                        items,
                        schema,
                        index: index + 1,
                    });
                }
                self.visitor.visit_element().inspect_err(|err| {
                    log::debug!("traversal aborted at `{}`[{index}]: {err}", schema.type_name());
                })?;
                if schema.len() > 0 {
                    self.push_frame(ConstFrame::Fields {
                        target: item,
                        schema,
                        index: 0,
                    });
                }
                Ok(())
            }
        }
    }
}

// -----------------------------------------------------------------------------
// VisitContext

/// Drives a [`Visitor`] over an object graph exclusively borrowed for `'a`.
pub struct VisitContext<'a, 'v> {
    visitor: &'v mut dyn Visitor,
    stack: Vec<Frame<'a>>,
    peak: usize,
}

impl<'a, 'v> VisitContext<'a, 'v> {
    /// Creates a context with an empty frame stack.
    pub fn new(visitor: &'v mut dyn Visitor) -> Self {
        Self {
            visitor,
            stack: Vec::new(),
            peak: 0,
        }
    }

    /// The visitor supplying values.
    #[inline(always)]
    pub fn visitor(&mut self) -> &mut (dyn Visitor + 'v) {
        &mut *self.visitor
    }

    /// Largest number of frames pending at once so far.
    #[inline]
    pub fn peak_depth(&self) -> usize {
        self.peak
    }

    #[inline]
    fn push_frame(&mut self, frame: Frame<'a>) {
        self.stack.push(frame);
        self.peak = self.peak.max(self.stack.len());
    }

    /// Schedules the fields of `value`.
    pub fn push<T: Visit>(&mut self, value: &'a mut T) {
        let schema = schema_of::<T>();
        if schema.len() > 0 {
            self.push_frame(Frame::Fields {
                target: PtrMut::from_mut(value),
                schema,
                index: 0,
            });
        }
    }

    /// Marks the start of a composite, then schedules its fields.
    pub fn enter<T: Visit>(&mut self, value: &'a mut T) -> Result<(), VisitError> {
        self.visitor.visit_element()?;
        self.push(value);
        Ok(())
    }

    /// Schedules each composite of `items` in order.
    pub fn push_elements<T: Visit>(&mut self, items: &'a mut [T]) {
        if !items.is_empty() {
            self.push_frame(Frame::Elements {
                items: ErasedSliceMut::from_mut(items),
                schema: schema_of::<T>(),
                index: 0,
            });
        }
    }

    /// Executes frames until the stack is empty or an action fails.
    ///
    /// On failure the remaining frames are dropped. Fields already read keep
    /// their new values; the rest keep whatever they held before.
    pub fn run(&mut self) -> Result<(), VisitError> {
        while let Some(frame) = self.stack.pop() {
            if let Err(err) = self.step(frame) {
                self.stack.clear();
                return Err(err);
            }
        }
        Ok(())
    }

    fn step(&mut self, frame: Frame<'a>) -> Result<(), VisitError> {
        match frame {
            Frame::Fields {
                target,
                schema,
                index,
            } => {
                if index >= schema.len() {
                    return Ok(());
                }
                if index + 1 < schema.len() {
                    // SAFETY: the successor sits below every frame this field
                    // pushes, so it is resumed only after they are all done.
                    let rest = unsafe { target.alias() };
                    self.push_frame(Frame::Fields {
                        target: rest,
                        schema,
                        index: index + 1,
                    });
                }
                // SAFETY: `target` was erased from a `&'a mut T` where `T`
                // owns `schema`. References from earlier fields are no
                // longer in use since their frames have been popped.
                unsafe { schema.read_field(target, index, self) }
                    .inspect_err(|err| log_abort(schema, index, err))
            }
            Frame::Elements {
                items,
                schema,
                index,
            } => {
                if index >= items.len() {
                    return Ok(());
                }
                if index + 1 < items.len() {
                    self.push_frame(Frame::Elements {
                        items,
                        schema,
                        index: index + 1,
                    });
                }
                self.visitor.visit_element().inspect_err(|err| {
                    log::debug!("traversal aborted at `{}`[{index}]: {err}", schema.type_name());
                })?;
                if schema.len() > 0 {
                    // SAFETY: `index` is in bounds and each item is handed
                    // out exactly once.
                    let item = unsafe { items.item(index) };
                    self.push_frame(Frame::Fields {
                        target: item,
                        schema,
                        index: 0,
                    });
                }
                Ok(())
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Entry points

/// Walks `value` in schema order, feeding `visitor` every persisted value.
pub fn visit<T: Visit>(value: &T, visitor: &mut dyn ConstVisitor) -> Result<(), VisitError> {
    let mut ctx = ConstVisitContext::new(visitor);
    ctx.push(value);
    ctx.run()
}

/// Walks `value` in schema order, filling every persisted field from
/// `visitor`.
pub fn visit_mut<T: Visit>(value: &mut T, visitor: &mut dyn Visitor) -> Result<(), VisitError> {
    let mut ctx = VisitContext::new(visitor);
    ctx.push(value);
    ctx.run()
}

// -----------------------------------------------------------------------------
// Tests
