use tracing::debug;

use super::dict::{self, DictFormat, DictValue, Entries};
use super::node::MerkleNode;
use super::tree::MerkleTree;
use super::types::{Digest, NodeIndex};
use crate::hash::Algorithm;
use crate::MerkleResult;

#[cfg(feature = "parallel")]
const PARALLEL_CHUNK: usize = 64;

/// Typed construction options for [`MerkleTree`].
///
/// ```
/// use merkle_engine::{Algorithm, TreeBuilder};
///
/// let tree = TreeBuilder::new()
///     .algorithm(Algorithm::Keccak256)
///     .retain_payloads(false)
///     .from_leaves(["a", "b", "c"]);
/// assert_eq!(tree.len(), 5);
/// assert!(tree.leaf(0).unwrap().payload().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeBuilder {
    algorithm: Algorithm,
    retain_payloads: bool,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            retain_payloads: true,
        }
    }
}

impl TreeBuilder {
    /// SHA-1 builder that retains payloads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the hash algorithm.
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Selects the algorithm by (case-insensitive) name.
    pub fn algorithm_name(self, name: &str) -> MerkleResult<Self> {
        Ok(self.algorithm(Algorithm::from_name(name)?))
    }

    /// Whether leaves keep their input bytes next to the digest.
    pub fn retain_payloads(mut self, retain: bool) -> Self {
        self.retain_payloads = retain;
        self
    }

    /// Builds a tree over `items` in order.
    pub fn from_leaves<I, T>(&self, items: I) -> MerkleTree
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let payloads: Vec<Vec<u8>> = items
            .into_iter()
            .map(|item| item.as_ref().to_vec())
            .collect();
        if payloads.is_empty() {
            debug!(algorithm = %self.algorithm, "built empty merkle tree");
            return MerkleTree::empty(self.algorithm);
        }

        let digests = hash_payloads(self.algorithm, &payloads);
        let mut nodes: Vec<MerkleNode> = payloads
            .into_iter()
            .zip(digests)
            .map(|(payload, digest)| {
                MerkleNode::hashed_leaf(
                    self.algorithm,
                    digest,
                    self.retain_payloads.then_some(payload),
                )
            })
            .collect();
        let leaves: Vec<NodeIndex> = (0..nodes.len()).collect();

        let mut level = leaves.clone();
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                if let &[left, right] = pair {
                    next.push(join(self.algorithm, &mut nodes, vec![left, right]));
                } else {
                    next.extend_from_slice(pair);
                }
            }
            level = next;
        }

        debug!(
            algorithm = %self.algorithm,
            leaves = leaves.len(),
            nodes = nodes.len(),
            "built merkle tree"
        );
        let root = level.first().copied();
        MerkleTree::from_parts(self.algorithm, nodes, leaves, root)
    }

    /// Builds the canonical tree of a mapping; see [`DictFormat`].
    pub fn from_dict<I, K, V>(&self, entries: I, format: DictFormat) -> MerkleTree
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DictValue>,
    {
        let entries = Entries::collect(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
            format,
        );
        let layout = dict::layout(entries, self.algorithm, self.retain_payloads);
        debug!(
            algorithm = %self.algorithm,
            ?format,
            leaves = layout.leaves.len(),
            nodes = layout.nodes.len(),
            "built canonical mapping tree"
        );
        MerkleTree::from_parts(self.algorithm, layout.nodes, layout.leaves, layout.root)
    }
}

/// Appends an internal node over `children` and links their parent pointers.
fn join(algorithm: Algorithm, nodes: &mut Vec<MerkleNode>, children: Vec<NodeIndex>) -> NodeIndex {
    let mut hasher = algorithm.hasher();
    for &child in &children {
        hasher.update(nodes[child].digest().as_bytes());
    }
    let index = nodes.len();
    for &child in &children {
        nodes[child].set_parent(index);
    }
    nodes.push(MerkleNode::internal(algorithm, hasher.finalize(), children));
    index
}

#[cfg(feature = "parallel")]
fn hash_payloads(algorithm: Algorithm, payloads: &[Vec<u8>]) -> Vec<Digest> {
    use rayon::prelude::*;
    payloads
        .par_iter()
        .with_min_len(PARALLEL_CHUNK)
        .map(|payload| algorithm.digest(payload))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn hash_payloads(algorithm: Algorithm, payloads: &[Vec<u8>]) -> Vec<Digest> {
    payloads
        .iter()
        .map(|payload| algorithm.digest(payload))
        .collect()
}
