use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::node::MerkleNode;
use super::tree::MerkleTree;
use super::types::{ensure_digest_len, Digest, NodeError, NodeIndex, ProofError, Side};
use crate::hash::Algorithm;
use crate::{MerkleError, MerkleResult};

/// Input of one child position inside a [`ProofStep`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    /// Digest of a child outside the proven set, carried by the proof.
    Sibling(Digest),
    /// Working leaf at this position of the proof's index list.
    Leaf(usize),
    /// Digest produced by an earlier step.
    Child,
}

/// One internal node on the path from the proven leaves to the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofStep {
    slots: Vec<Slot>,
}

impl ProofStep {
    pub(crate) fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    /// Children of the node, in hashing order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Sibling digests with their side relative to the first proven child.
    pub fn siblings(&self) -> Vec<(Side, &Digest)> {
        let anchor = self
            .slots
            .iter()
            .position(|slot| !matches!(slot, Slot::Sibling(_)))
            .unwrap_or(self.slots.len());
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(position, slot)| match slot {
                Slot::Sibling(digest) if position < anchor => Some((Side::Left, digest)),
                Slot::Sibling(digest) => Some((Side::Right, digest)),
                _ => None,
            })
            .collect()
    }
}

/// Proven leaf: its digest and, when known, the bytes it was hashed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofLeaf {
    payload: Option<Vec<u8>>,
    digest: Digest,
}

impl ProofLeaf {
    pub(crate) fn new(payload: Option<Vec<u8>>, digest: Digest) -> Self {
        Self { payload, digest }
    }

    /// Bytes the leaf was hashed from, when known.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Digest of the leaf.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }
}

/// Inclusion proof for one or more leaves of a [`MerkleTree`].
///
/// The proof keeps two leaf buffers: the leaves captured at generation time
/// and a working copy that [`MerkleProof::update`] replaces. Validation
/// replays the path over the working copy and compares the result with the
/// root captured at generation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    algorithm: Algorithm,
    indices: Vec<usize>,
    steps: Vec<ProofStep>,
    expected: Digest,
    original: Vec<ProofLeaf>,
    working: Vec<ProofLeaf>,
}

impl MerkleProof {
    /// Opens a proof for the leaves at `indices` of `tree`.
    ///
    /// Indices are sorted and deduplicated. Steps are emitted bottom-up in
    /// post-order over the sub-tree spanned by the selected leaves.
    pub fn generate<I>(tree: &MerkleTree, indices: I) -> MerkleResult<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let expected = tree.root()?.clone();
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        if indices.is_empty() {
            return Err(ProofError::NoLeaves.into());
        }
        let leaf_count = tree.leaf_count();
        if let Some(&index) = indices.iter().find(|&&index| index >= leaf_count) {
            return Err(MerkleError::IndexOutOfRange {
                index,
                len: leaf_count,
            });
        }

        let leaf_nodes = tree.leaf_indices();
        let positions: HashMap<NodeIndex, usize> = indices
            .iter()
            .enumerate()
            .map(|(position, &leaf)| (leaf_nodes[leaf], position))
            .collect();
        let mut covered = HashSet::new();
        for &node in positions.keys() {
            let mut current = Some(node);
            while let Some(index) = current {
                if !covered.insert(index) {
                    break;
                }
                current = tree[index].parent();
            }
        }

        let steps = tree
            .root_index()
            .map(|root| emit_steps(tree, root, &covered, &positions))
            .unwrap_or_default();

        let original: Vec<ProofLeaf> = indices
            .iter()
            .map(|&leaf| {
                let node = &tree[leaf_nodes[leaf]];
                ProofLeaf::new(node.payload().map(<[u8]>::to_vec), node.digest().clone())
            })
            .collect();
        debug!(
            algorithm = %tree.algorithm(),
            indices = ?indices,
            steps = steps.len(),
            "generated merkle proof"
        );
        Ok(Self {
            algorithm: tree.algorithm(),
            indices,
            steps,
            expected,
            working: original.clone(),
            original,
        })
    }

    pub(crate) fn from_parts(
        algorithm: Algorithm,
        indices: Vec<usize>,
        steps: Vec<ProofStep>,
        expected: Digest,
        original: Vec<ProofLeaf>,
        working: Vec<ProofLeaf>,
    ) -> Self {
        Self {
            algorithm,
            indices,
            steps,
            expected,
            original,
            working,
        }
    }

    /// Replaces the working leaves with `values`, hashed with the proof's
    /// algorithm. The path and the expected root are left untouched.
    pub fn update<I, T>(&mut self, values: I) -> MerkleResult<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let working: Vec<ProofLeaf> = values
            .into_iter()
            .map(|value| {
                let payload = value.as_ref().to_vec();
                let digest = self.algorithm.digest(&payload);
                ProofLeaf::new(Some(payload), digest)
            })
            .collect();
        self.replace_working(working)
    }

    /// Replaces the working leaves with precomputed digests.
    pub fn update_digests<I>(&mut self, digests: I) -> MerkleResult<()>
    where
        I: IntoIterator<Item = Digest>,
    {
        let working = digests
            .into_iter()
            .map(|digest| {
                ensure_digest_len(self.algorithm, &digest)?;
                Ok(ProofLeaf::new(None, digest))
            })
            .collect::<MerkleResult<Vec<_>>>()?;
        self.replace_working(working)
    }

    /// Replaces the working leaves with the digests and payloads of `nodes`,
    /// typically the leaves of a rebuilt tree.
    pub fn update_nodes<'a, I>(&mut self, nodes: I) -> MerkleResult<()>
    where
        I: IntoIterator<Item = &'a MerkleNode>,
    {
        let working = nodes
            .into_iter()
            .map(|node| -> MerkleResult<ProofLeaf> {
                if node.algorithm() != self.algorithm {
                    return Err(NodeError::AlgorithmMismatch {
                        expected: self.algorithm,
                        got: node.algorithm(),
                    }
                    .into());
                }
                let payload = node.payload().map(<[u8]>::to_vec);
                Ok(ProofLeaf::new(payload, node.digest().clone()))
            })
            .collect::<MerkleResult<Vec<_>>>()?;
        self.replace_working(working)
    }

    fn replace_working(&mut self, working: Vec<ProofLeaf>) -> MerkleResult<()> {
        if working.len() != self.indices.len() {
            return Err(ProofError::LeafCountMismatch {
                expected: self.indices.len(),
                got: working.len(),
            }
            .into());
        }
        self.working = working;
        Ok(())
    }

    /// Restores the working leaves to the ones captured at generation time.
    pub fn refresh(&mut self) {
        self.working = self.original.clone();
    }

    /// Whether the working leaves reproduce the expected root.
    pub fn validate(&self) -> bool {
        match self.try_validate() {
            Ok(valid) => valid,
            Err(err) => {
                debug!(error = %err, "merkle proof rejected");
                false
            }
        }
    }

    /// Like [`MerkleProof::validate`] but reports why validation failed.
    pub fn try_validate(&self) -> MerkleResult<bool> {
        let actual = self.compute_root()?;
        if actual == self.expected {
            Ok(true)
        } else {
            Err(ProofError::RootMismatch {
                expected: self.expected.clone(),
                actual,
            }
            .into())
        }
    }

    /// Replays the path over the working leaves.
    pub fn compute_root(&self) -> Result<Digest, ProofError> {
        if self.working.len() != self.indices.len() {
            return Err(ProofError::MalformedPath {
                reason: "working leaves do not match indices",
            });
        }
        if self.steps.is_empty() {
            return match self.working.as_slice() {
                [single] => Ok(single.digest.clone()),
                _ => Err(ProofError::MalformedPath {
                    reason: "empty path must cover exactly one leaf",
                }),
            };
        }

        let mut used = vec![false; self.working.len()];
        let mut stack: Vec<Digest> = Vec::new();
        for step in &self.steps {
            let pending = step
                .slots
                .iter()
                .filter(|slot| matches!(slot, Slot::Child))
                .count();
            let start = stack.len().checked_sub(pending).ok_or(ProofError::MalformedPath {
                reason: "step consumes more digests than produced",
            })?;
            let mut produced = stack.split_off(start).into_iter();
            let mut hasher = self.algorithm.hasher();
            for slot in &step.slots {
                match slot {
                    Slot::Sibling(digest) => hasher.update(digest.as_bytes()),
                    Slot::Leaf(position) => {
                        let leaf = self.working.get(*position).ok_or(ProofError::MalformedPath {
                            reason: "leaf slot out of range",
                        })?;
                        if std::mem::replace(&mut used[*position], true) {
                            return Err(ProofError::MalformedPath {
                                reason: "leaf slot used twice",
                            });
                        }
                        hasher.update(leaf.digest.as_bytes());
                    }
                    Slot::Child => {
                        let digest = produced.next().ok_or(ProofError::MalformedPath {
                            reason: "step consumes more digests than produced",
                        })?;
                        hasher.update(digest.as_bytes());
                    }
                }
            }
            stack.push(hasher.finalize());
        }

        if used.iter().any(|used| !used) {
            return Err(ProofError::MalformedPath {
                reason: "path leaves a proven leaf unused",
            });
        }
        match (stack.pop(), stack.is_empty()) {
            (Some(root), true) => Ok(root),
            _ => Err(ProofError::MalformedPath {
                reason: "path does not converge to a single root",
            }),
        }
    }

    /// Algorithm the proof was generated with.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Sorted, deduplicated leaf positions covered by the proof.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Path steps in replay order.
    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    /// Tree root captured at generation time.
    pub fn expected(&self) -> &Digest {
        &self.expected
    }

    /// Expected root as lowercase hex.
    pub fn expected_hex(&self) -> String {
        self.expected.to_hex()
    }

    /// Working leaves, aligned with [`MerkleProof::indices`].
    pub fn leaves(&self) -> &[ProofLeaf] {
        &self.working
    }

    /// Leaves captured at generation time.
    pub fn original_leaves(&self) -> &[ProofLeaf] {
        &self.original
    }
}

/// Internal node whose slots are still being collected.
struct PendingStep {
    node: NodeIndex,
    next: usize,
    slots: Vec<Slot>,
}

impl PendingStep {
    fn new(node: NodeIndex) -> Self {
        Self {
            node,
            next: 0,
            slots: Vec::new(),
        }
    }
}

/// Walks the covered nodes below `root` in post-order, emitting one step per
/// internal node.
fn emit_steps(
    tree: &MerkleTree,
    root: NodeIndex,
    covered: &HashSet<NodeIndex>,
    positions: &HashMap<NodeIndex, usize>,
) -> Vec<ProofStep> {
    let mut steps = Vec::new();
    if tree[root].children().is_empty() {
        return steps;
    }
    let mut pending = vec![PendingStep::new(root)];
    while let Some(frame) = pending.last_mut() {
        let Some(&child) = tree[frame.node].children().get(frame.next) else {
            if let Some(done) = pending.pop() {
                steps.push(ProofStep::new(done.slots));
            }
            continue;
        };
        frame.next += 1;
        if let Some(&position) = positions.get(&child) {
            frame.slots.push(Slot::Leaf(position));
        } else if covered.contains(&child) {
            frame.slots.push(Slot::Child);
            pending.push(PendingStep::new(child));
        } else {
            frame.slots.push(Slot::Sibling(tree[child].digest().clone()));
        }
    }
    steps
}
