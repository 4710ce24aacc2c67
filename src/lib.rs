//! Core library entry point for the `merkle-engine` crate.
//!
//! The crate builds Merkle trees over ordered data, opens compact inclusion
//! proofs for one or more leaves, validates those proofs against a captured
//! root and moves trees and proofs through a textual (JSON) and a compact
//! binary codec.
//!
//! * [`hash`] – the closed family of digest algorithms selectable by name.
//! * [`merkle`] – node/tree data model, construction rules and proofs.
//! * [`codec`] – `dumps`/`loads` for trees and proofs.
//! * [`ser`] – little-endian framing primitives shared by the binary codec.
//!
//! ```
//! use merkle_engine::{Algorithm, MerkleTree};
//!
//! let tree = MerkleTree::from_leaves([b"data1", b"data2"], Algorithm::Sha256);
//! let mut proof = tree.generate_proof([1]).unwrap();
//! assert!(proof.validate());
//!
//! proof.update([b"forged"]).unwrap();
//! assert!(!proof.validate());
//! ```

pub mod codec;
pub mod hash;
pub mod merkle;
pub mod ser;

pub use codec::{Codec, Encoding, FORMAT_VERSION};
pub use hash::{algorithms_available, algorithms_guaranteed, Algorithm, DigestAlgorithm};
pub use merkle::{
    BreadthFirst, BreadthFirstIndices, DictFormat, DictValue, Digest, MerkleNode, MerkleProof,
    MerkleTree, NodeError, NodeIndex, NodeKind, ProofError, ProofLeaf, ProofStep, Side, Slot,
    TreeBuilder, TreeView,
};
pub use ser::{SerError, SerKind};

/// Result type used throughout the library.
pub type MerkleResult<T> = core::result::Result<T, MerkleError>;

/// Error enumeration for the Merkle engine.
///
/// Every variant is recoverable by the caller; none of them is raised by
/// equality or hashing, which report inequality instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleError {
    /// The requested digest name is not part of the guaranteed set.
    #[error("unsupported digest algorithm `{name}`")]
    UnsupportedAlgorithm {
        /// Name as supplied by the caller.
        name: String,
    },
    /// A root or structural query was issued against a tree without leaves.
    #[error("tree has no leaves")]
    EmptyTree,
    /// A leaf or node index fell outside `0..len`.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of addressable items.
        len: usize,
    },
    /// Malformed proof input or, in `try_validate`, a failed validation.
    #[error(transparent)]
    Proof(#[from] ProofError),
    /// Encode/decode failure.
    #[error(transparent)]
    Serde(#[from] SerError),
    /// Digest/node integrity failure.
    #[error(transparent)]
    Node(#[from] NodeError),
}
