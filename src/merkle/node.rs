use std::hash::{Hash, Hasher};

use super::types::{ensure_digest_len, Digest, NodeError, NodeIndex};
use crate::hash::Algorithm;

/// Whether a node carries data or combines children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Hashed input item. The payload is absent when the tree was built
    /// without retaining payloads or the node was restored from a digest.
    Leaf {
        /// Original item bytes.
        payload: Option<Vec<u8>>,
    },
    /// Node whose digest is the hash of its children's digests in order.
    Internal {
        /// Arena indices of the children, in hashing order.
        children: Vec<NodeIndex>,
    },
}

/// A single node of a [`MerkleTree`](super::MerkleTree).
///
/// Equality and hashing only consider the algorithm and the digest bytes, so a
/// leaf and an internal node with the same digest compare equal.
#[derive(Clone, Debug)]
pub struct MerkleNode {
    algorithm: Algorithm,
    digest: Digest,
    parent: Option<NodeIndex>,
    kind: NodeKind,
}

impl MerkleNode {
    /// Hashes `data` into a stand-alone leaf that keeps its payload.
    pub fn leaf(data: impl AsRef<[u8]>, algorithm: Algorithm) -> Self {
        let payload = data.as_ref().to_vec();
        Self {
            algorithm,
            digest: algorithm.digest(&payload),
            parent: None,
            kind: NodeKind::Leaf {
                payload: Some(payload),
            },
        }
    }

    /// Wraps an already computed digest as a payload-less leaf.
    pub fn from_digest(digest: Digest, algorithm: Algorithm) -> Result<Self, NodeError> {
        ensure_digest_len(algorithm, &digest)?;
        Ok(Self::hashed_leaf(algorithm, digest, None))
    }

    pub(crate) fn hashed_leaf(
        algorithm: Algorithm,
        digest: Digest,
        payload: Option<Vec<u8>>,
    ) -> Self {
        Self {
            algorithm,
            digest,
            parent: None,
            kind: NodeKind::Leaf { payload },
        }
    }

    pub(crate) fn internal(
        algorithm: Algorithm,
        digest: Digest,
        children: Vec<NodeIndex>,
    ) -> Self {
        Self {
            algorithm,
            digest,
            parent: None,
            kind: NodeKind::Internal { children },
        }
    }

    pub(crate) fn set_parent(&mut self, parent: NodeIndex) {
        self.parent = Some(parent);
    }

    /// Algorithm the digest was computed with.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Alias of [`MerkleNode::algorithm`].
    pub fn dtype(&self) -> Algorithm {
        self.algorithm
    }

    /// Digest of the node.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Digest as lowercase hex.
    pub fn hexdigest(&self) -> String {
        self.digest.to_hex()
    }

    /// First eight hex characters of the digest.
    pub fn short_hex(&self) -> String {
        let mut hex = self.digest.to_hex();
        hex.truncate(8);
        hex
    }

    /// Leaf or internal payload of the node.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether the node has no children.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Retained payload of a leaf; `None` for internal nodes.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.kind {
            NodeKind::Leaf { payload } => payload.as_deref(),
            NodeKind::Internal { .. } => None,
        }
    }

    /// Children in hashing order; empty for leaves.
    pub fn children(&self) -> &[NodeIndex] {
        match &self.kind {
            NodeKind::Leaf { .. } => &[],
            NodeKind::Internal { children } => children,
        }
    }

    /// Parent index, `None` for the root and for stand-alone nodes.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }
}

impl PartialEq for MerkleNode {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.digest == other.digest
    }
}

impl Eq for MerkleNode {}

impl Hash for MerkleNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.algorithm.hash(state);
        self.digest.hash(state);
    }
}
