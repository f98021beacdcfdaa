//! # packwire
//!
//! A distinctively simple, self-describing binary field codec.
//!
//! ## Philosophy
//!
//! Every field is `(id, type, value)`. Ids are 1-based and strictly
//! increasing within a container; the wire carries only the **delta**
//! from the previous id, so a reader built against an older schema can
//! safely skip fields it doesn't recognize, and a writer can omit
//! default-valued fields entirely.
//!
//! ## Format
//!
//! - **Tag byte**: type in the high nibble, id-delta (and, for scalars
//!   that fit, the value itself) packed into the low nibble.
//! - **Scalars**: inlined into the tag when the value fits in one bit,
//!   otherwise a trailing varint.
//! - **Blobs** (`str`/`bin`): tag, a varint length (only when non-empty),
//!   raw bytes.
//! - **Containers** (`obj`/`array`): tag, nested fields, a `0x00`
//!   terminator.
//!
//! All multi-byte integers are varints (little-endian base-128); there
//! are no fixed-width integers on the wire.

mod container;
mod error;
mod io;
mod reader;
mod tag;
mod varint;
mod writer;
mod zigzag;

pub use container::Scope;
pub use error::{AssertionFailure, Error, FormatError, Result};
pub use io::{Sink, Source};
pub use reader::Reader;
pub use tag::Type;
pub use writer::Writer;

#[cfg(test)]
mod tests;
