//! Process-wide schema cache.
//!
//! Every [`Visit`] type gets exactly one [`Schema`], built on first use and
//! leaked so that the returned reference is `'static`. The cache is a
//! [`TypeId`]-keyed map behind an [`RwLock`]: lookups after the first one
//! only take the read lock.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::hash::{BuildHasher, Hasher};
use std::sync::{PoisonError, RwLock};

use hashbrown::HashMap;

use crate::element::Visit;
use crate::schema::Schema;

type Entry = &'static (dyn Any + Send + Sync);

// -----------------------------------------------------------------------------
// Storage

/// Passes the hash the standard library already computed for a [`TypeId`].
#[derive(Clone, Copy, Default, Debug)]
struct NoOpHasher {
    hash: u64,
}

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(u64::from(*byte));
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

#[derive(Clone, Copy, Default, Debug)]
struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher { hash: 0 }
    }
}

static SCHEMAS: RwLock<HashMap<TypeId, Entry, NoOpHashState>> =
    RwLock::new(HashMap::with_hasher(NoOpHashState));

// -----------------------------------------------------------------------------
// Lookup

/// Returns the schema of `T`, building it on first use.
///
/// The builder runs outside the lock, so schemas may look up other
/// schemas while being built. If two threads race on the first use, both
/// build and one result is kept.
///
/// # Examples
///
/// ```
/// use vc_visit::{Schema, Visit, lens, schema_of};
///
/// #[derive(Default)]
/// struct Pair { a: u8, b: u8 }
///
/// impl Visit for Pair {
///     fn build_schema() -> Schema<Self> {
///         Schema::new().member("a", lens!(Pair, a)).member("b", lens!(Pair, b))
///     }
/// }
///
/// let first = schema_of::<Pair>();
/// let second = schema_of::<Pair>();
/// assert!(core::ptr::eq(first, second));
/// ```
pub fn schema_of<T: Visit>() -> &'static Schema<T> {
    let type_id = TypeId::of::<T>();
    let entry = match get(type_id) {
        Some(entry) => entry,
        None => {
            let schema = T::build_schema();
            log::trace!(
                "built schema for `{}` with {} fields",
                schema.type_name(),
                schema.len()
            );
            insert(type_id, Box::new(schema))
        }
    };

    match entry.downcast_ref::<Schema<T>>() {
        Some(schema) => schema,
        None => unreachable!(
            "schema registry entry for `{}` has the wrong type",
            core::any::type_name::<T>()
        ),
    }
}

#[inline(never)]
fn get(type_id: TypeId) -> Option<Entry> {
    SCHEMAS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .copied()
}

#[inline(never)]
fn insert(type_id: TypeId, built: Box<dyn Any + Send + Sync>) -> Entry {
    *SCHEMAS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(type_id)
        .or_insert_with(|| &*Box::leak(built))
}
