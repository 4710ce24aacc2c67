//! Little-endian framing used by the binary codec.
//!
//! [`ByteWriter`] produces the layout and [`ByteReader`] walks it back. Both
//! speak in `u32` lengths and counts, one-byte presence flags and fixed-width
//! digests. Every failed read reports the [`SerKind`] section and the field it
//! was decoding.

mod error;
mod reader;
mod writer;

pub use error::{SerError, SerKind, SerResult};
pub use reader::ByteReader;
pub use writer::{ensure_u32, ByteWriter};
