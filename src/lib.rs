//! Schema-driven binary persistence and the raster font resource built on it.
//!
//! - [`visit`]: schemas, the non-recursive traversal engine and the binary backend.
//! - [`font`]: bitmap fonts loaded and saved through [`visit`].
//! - [`ptr`]: the type-erased pointers the engine walks with.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use vc_font as font;
pub use vc_ptr as ptr;
pub use vc_visit as visit;
