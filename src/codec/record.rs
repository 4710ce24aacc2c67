//! Encoding-neutral records for trees and proofs.
//!
//! Both encodings move these records; converting a record back into a tree or
//! proof re-checks every structural and hashing invariant, so a payload that
//! was edited by hand cannot produce an inconsistent value.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::FORMAT_VERSION;
use crate::hash::Algorithm;
use crate::merkle::{
    Digest, MerkleNode, MerkleProof, MerkleTree, NodeIndex, ProofLeaf, ProofStep, Slot,
};
use crate::ser::{ensure_u32, SerError, SerKind, SerResult};

/// Payload bytes rendered as lowercase hex in the textual encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct HexBytes(#[serde(with = "hex::serde")] pub(crate) Vec<u8>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TreeRecord {
    pub(crate) version: u16,
    pub(crate) algorithm: String,
    pub(crate) root: Option<u32>,
    pub(crate) leaves: Vec<u32>,
    pub(crate) nodes: Vec<NodeRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NodeRecord {
    pub(crate) digest: Digest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) payload: Option<HexBytes>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) children: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProofRecord {
    pub(crate) version: u16,
    pub(crate) algorithm: String,
    pub(crate) indices: Vec<u32>,
    pub(crate) expected: Digest,
    pub(crate) steps: Vec<Vec<SlotRecord>>,
    pub(crate) original: Vec<LeafRecord>,
    pub(crate) working: Vec<LeafRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SlotRecord {
    Sibling(Digest),
    Leaf(u32),
    Child,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LeafRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) payload: Option<HexBytes>,
    pub(crate) digest: Digest,
}

pub(crate) fn check_version(version: u16, kind: SerKind) -> SerResult<()> {
    if version == FORMAT_VERSION {
        Ok(())
    } else {
        Err(SerError::UnsupportedVersion {
            kind,
            found: version,
        })
    }
}

fn check_width(algorithm: Algorithm, digest: &Digest, kind: SerKind) -> SerResult<()> {
    if digest.len() == algorithm.digest_size() {
        Ok(())
    } else {
        Err(SerError::inconsistent(kind, "digest length does not match algorithm"))
    }
}

fn check_payload(
    algorithm: Algorithm,
    payload: Option<&HexBytes>,
    digest: &Digest,
    kind: SerKind,
) -> SerResult<()> {
    match payload {
        Some(HexBytes(bytes)) if algorithm.digest(bytes) != *digest => {
            Err(SerError::inconsistent(kind, "payload does not hash to its digest"))
        }
        _ => Ok(()),
    }
}

impl TreeRecord {
    pub(crate) fn from_tree(tree: &MerkleTree) -> SerResult<Self> {
        let index = |value: NodeIndex, field| ensure_u32(value, SerKind::Tree, field);
        let nodes: Vec<NodeRecord> = tree
            .nodes()
            .iter()
            .map(|node| -> SerResult<NodeRecord> {
                Ok(NodeRecord {
                    digest: node.digest().clone(),
                    payload: node.payload().map(|bytes| HexBytes(bytes.to_vec())),
                    children: node
                        .children()
                        .iter()
                        .map(|&child| index(child, "children"))
                        .collect::<SerResult<_>>()?,
                })
            })
            .collect::<SerResult<_>>()?;
        Ok(Self {
            version: FORMAT_VERSION,
            algorithm: tree.algorithm().name().to_string(),
            root: tree.root_index().map(|root| index(root, "root")).transpose()?,
            leaves: tree
                .leaf_indices()
                .iter()
                .map(|&leaf| index(leaf, "leaves"))
                .collect::<SerResult<_>>()?,
            nodes,
        })
    }

    /// Rebuilds the tree under `algorithm`, checking every invariant.
    pub(crate) fn to_tree(&self, algorithm: Algorithm) -> SerResult<MerkleTree> {
        const KIND: SerKind = SerKind::Tree;
        let len = self.nodes.len();
        let Some(root) = self.root.map(|root| root as usize) else {
            return if len == 0 && self.leaves.is_empty() {
                Ok(MerkleTree::empty(algorithm))
            } else {
                Err(SerError::inconsistent(KIND, "nodes present without a root"))
            };
        };
        if root >= len {
            return Err(SerError::inconsistent(KIND, "root index out of range"));
        }

        let mut parents: Vec<Option<NodeIndex>> = vec![None; len];
        for (index, node) in self.nodes.iter().enumerate() {
            check_width(algorithm, &node.digest, SerKind::Node)?;
            if node.children.is_empty() {
                check_payload(algorithm, node.payload.as_ref(), &node.digest, SerKind::Node)?;
                continue;
            }
            if node.payload.is_some() {
                return Err(SerError::inconsistent(
                    SerKind::Node,
                    "internal node carries a payload",
                ));
            }
            if node.children.len() < 2 {
                return Err(SerError::inconsistent(
                    SerKind::Node,
                    "internal node has a single child",
                ));
            }
            for &child in &node.children {
                let slot = parents
                    .get_mut(child as usize)
                    .ok_or_else(|| {
                        SerError::inconsistent(SerKind::Node, "child index out of range")
                    })?;
                if slot.replace(index).is_some() {
                    return Err(SerError::inconsistent(KIND, "node has more than one parent"));
                }
            }
        }
        for (index, parent) in parents.iter().enumerate() {
            if (index == root) != parent.is_none() {
                return Err(SerError::inconsistent(KIND, "only the root may lack a parent"));
            }
        }

        let mut seen = vec![false; len];
        let mut queue = VecDeque::from([root]);
        let mut reached = 0;
        while let Some(index) = queue.pop_front() {
            if std::mem::replace(&mut seen[index], true) {
                return Err(SerError::inconsistent(KIND, "node reachable twice"));
            }
            reached += 1;
            queue.extend(self.nodes[index].children.iter().map(|&child| child as usize));
        }
        if reached != len {
            return Err(SerError::inconsistent(KIND, "node unreachable from the root"));
        }

        let mut is_listed = vec![false; len];
        for &leaf in &self.leaves {
            let listed = is_listed
                .get_mut(leaf as usize)
                .ok_or_else(|| SerError::inconsistent(KIND, "leaf index out of range"))?;
            if std::mem::replace(listed, true) {
                return Err(SerError::inconsistent(KIND, "leaf listed twice"));
            }
            if !self.nodes[leaf as usize].children.is_empty() {
                return Err(SerError::inconsistent(KIND, "leaf list names an internal node"));
            }
        }
        let childless = self.nodes.iter().filter(|node| node.children.is_empty()).count();
        if childless != self.leaves.len() {
            return Err(SerError::inconsistent(KIND, "leaf list misses a childless node"));
        }

        let mut nodes = Vec::with_capacity(len);
        for node in &self.nodes {
            if node.children.is_empty() {
                nodes.push(MerkleNode::hashed_leaf(
                    algorithm,
                    node.digest.clone(),
                    node.payload.as_ref().map(|HexBytes(bytes)| bytes.clone()),
                ));
                continue;
            }
            let mut hasher = algorithm.hasher();
            for &child in &node.children {
                hasher.update(self.nodes[child as usize].digest.as_bytes());
            }
            if hasher.finalize() != node.digest {
                return Err(SerError::inconsistent(
                    SerKind::Node,
                    "internal digest does not match children",
                ));
            }
            nodes.push(MerkleNode::internal(
                algorithm,
                node.digest.clone(),
                node.children.iter().map(|&child| child as usize).collect(),
            ));
        }
        for (node, parent) in nodes.iter_mut().zip(parents) {
            if let Some(parent) = parent {
                node.set_parent(parent);
            }
        }

        let leaves = self.leaves.iter().map(|&leaf| leaf as usize).collect();
        Ok(MerkleTree::from_parts(algorithm, nodes, leaves, Some(root)))
    }
}

impl ProofRecord {
    pub(crate) fn from_proof(proof: &MerkleProof) -> SerResult<Self> {
        let index = |value: usize, kind, field| ensure_u32(value, kind, field);
        let leaves = |leaves: &[ProofLeaf]| -> Vec<LeafRecord> {
            leaves
                .iter()
                .map(|leaf| LeafRecord {
                    payload: leaf.payload().map(|bytes| HexBytes(bytes.to_vec())),
                    digest: leaf.digest().clone(),
                })
                .collect()
        };
        let steps: Vec<Vec<SlotRecord>> = proof
            .steps()
            .iter()
            .map(|step| {
                step.slots()
                    .iter()
                    .map(|slot| -> SerResult<SlotRecord> {
                        Ok(match slot {
                            Slot::Sibling(digest) => SlotRecord::Sibling(digest.clone()),
                            Slot::Leaf(position) => {
                                SlotRecord::Leaf(index(*position, SerKind::ProofStep, "leaf")?)
                            }
                            Slot::Child => SlotRecord::Child,
                        })
                    })
                    .collect::<SerResult<_>>()
            })
            .collect::<SerResult<_>>()?;
        Ok(Self {
            version: FORMAT_VERSION,
            algorithm: proof.algorithm().name().to_string(),
            indices: proof
                .indices()
                .iter()
                .map(|&leaf| index(leaf, SerKind::Proof, "indices"))
                .collect::<SerResult<_>>()?,
            expected: proof.expected().clone(),
            steps,
            original: leaves(proof.original_leaves()),
            working: leaves(proof.leaves()),
        })
    }

    /// Rebuilds the proof under `algorithm`.
    ///
    /// Only the shape is checked; whether the working leaves still validate
    /// is left to [`MerkleProof::validate`].
    pub(crate) fn to_proof(&self, algorithm: Algorithm) -> SerResult<MerkleProof> {
        const KIND: SerKind = SerKind::Proof;
        if self.indices.is_empty() {
            return Err(SerError::inconsistent(KIND, "proof covers no leaves"));
        }
        if self.indices.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(SerError::inconsistent(KIND, "indices are not strictly increasing"));
        }
        let count = self.indices.len();
        if self.original.len() != count || self.working.len() != count {
            return Err(SerError::inconsistent(KIND, "leaf buffers do not match indices"));
        }
        check_width(algorithm, &self.expected, KIND)?;

        let mut steps = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            if step.is_empty() {
                return Err(SerError::inconsistent(SerKind::ProofStep, "step has no slots"));
            }
            let mut slots = Vec::with_capacity(step.len());
            for slot in step {
                slots.push(match slot {
                    SlotRecord::Sibling(digest) => {
                        check_width(algorithm, digest, SerKind::ProofStep)?;
                        Slot::Sibling(digest.clone())
                    }
                    SlotRecord::Leaf(position) if (*position as usize) < count => {
                        Slot::Leaf(*position as usize)
                    }
                    SlotRecord::Leaf(_) => {
                        return Err(SerError::inconsistent(
                            SerKind::ProofStep,
                            "leaf slot out of range",
                        ))
                    }
                    SlotRecord::Child => Slot::Child,
                });
            }
            steps.push(ProofStep::new(slots));
        }

        let leaves = |records: &[LeafRecord]| {
            records
                .iter()
                .map(|record| -> SerResult<ProofLeaf> {
                    check_width(algorithm, &record.digest, SerKind::ProofLeaf)?;
                    let payload = record.payload.as_ref();
                    check_payload(algorithm, payload, &record.digest, SerKind::ProofLeaf)?;
                    Ok(ProofLeaf::new(
                        record.payload.as_ref().map(|HexBytes(bytes)| bytes.clone()),
                        record.digest.clone(),
                    ))
                })
                .collect::<SerResult<Vec<_>>>()
        };

        Ok(MerkleProof::from_parts(
            algorithm,
            self.indices.iter().map(|&leaf| leaf as usize).collect(),
            steps,
            self.expected.clone(),
            leaves(&self.original)?,
            leaves(&self.working)?,
        ))
    }
}
