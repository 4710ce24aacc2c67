//! Merkle trees and inclusion proofs.
//!
//! The module fixes the following construction rules, which every serialized
//! payload versions through [`FORMAT_VERSION`](crate::codec::FORMAT_VERSION):
//!
//! * **Leaves:** each input item is hashed on its own with the tree's
//!   algorithm. There is no leaf/node domain tag and no length prefix.
//! * **Internal nodes:** the digest is the hash of the children's digests
//!   concatenated in order.
//! * **Odd levels:** when a level of [`MerkleTree::from_leaves`] has an odd
//!   number of nodes, the last one is carried to the next level unchanged
//!   (no duplication, no re-hash). A tree over `n` leaves has `2n - 1` nodes.
//! * **Mappings:** [`MerkleTree::from_dict`] orders the children of every
//!   mapping by digest, so the root does not depend on key order.
//!
//! Trees are stored as a flat arena of [`MerkleNode`]s addressed by
//! [`NodeIndex`]; nodes keep parent and child indices instead of references.

mod builder;
mod dict;
mod iter;
mod node;
mod proof;
mod tree;
mod types;
mod view;

pub use builder::TreeBuilder;
pub use dict::{DictFormat, DictValue};
pub use iter::{BreadthFirst, BreadthFirstIndices};
pub use node::{MerkleNode, NodeKind};
pub use proof::{MerkleProof, ProofLeaf, ProofStep, Slot};
pub use tree::MerkleTree;
pub use types::{Digest, NodeError, NodeIndex, ProofError, Side};
pub use view::TreeView;
