//! Digest algorithms for the Merkle engine.
//!
//! The set of algorithms is closed and fixed at compile time. Names are
//! resolved case-insensitively through a static registry so that textual
//! payloads can carry the algorithm as a plain string.
//!
//! * [`Algorithm`] – the selectable algorithm identifiers and one-shot
//!   hashing.
//! * [`DigestAlgorithm`] – an incremental `update`/`finalize` hasher over one
//!   of those algorithms, backed by the RustCrypto implementations.
//!
//! Output is bit-for-bit the standard reference output: FIPS 180-4 for the
//! SHA family, the original Keccak submission padding (`0x01`) for the
//! `keccak*` names and RFC 7693 for BLAKE2.

mod algorithm;
mod hasher;

pub use algorithm::{algorithms_available, algorithms_guaranteed, Algorithm};
pub use hasher::DigestAlgorithm;
