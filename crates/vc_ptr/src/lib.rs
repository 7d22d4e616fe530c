//! Lifetimed, type-erased pointers used by the traversal engine.
//!
//! The engine keeps one stack of pending frames for every type it visits,
//! so frames cannot be generic over the visited type. These wrappers carry
//! the address of the target together with the lifetime of the borrow it
//! was created from, and leave the concrete type to the schema that later
//! reads the frame.
//!
//! **Ptr** and **PtrMut**
//!
//! [`Ptr<'a>`] and [`PtrMut<'a>`] are type-erased `&'a T` and `&'a mut T`
//! equivalents. Converting back to a typed reference is `unsafe`: the caller
//! names the type and takes responsibility for aliasing.
//!
//! **ErasedSlice** and **ErasedSliceMut**
//!
//! [`ErasedSlice<'a>`] and [`ErasedSliceMut<'a>`] are type-erased `&'a [T]`
//! and `&'a mut [T]`. They remember the element stride, so single items can
//! be addressed without knowing `T`.
#![expect(unsafe_code, reason = "Raw pointers are inherently unsafe.")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Modules

mod erased_slice;
mod type_erased;

// -----------------------------------------------------------------------------
// Top-level exports

pub use erased_slice::{ErasedSlice, ErasedSliceMut};
pub use type_erased::{Ptr, PtrMut};
