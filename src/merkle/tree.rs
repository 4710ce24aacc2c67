use std::fmt;
use std::ops::Index;
use std::slice::SliceIndex;

use super::builder::TreeBuilder;
use super::dict::{DictFormat, DictValue};
use super::iter::{BreadthFirst, BreadthFirstIndices};
use super::node::MerkleNode;
use super::proof::MerkleProof;
use super::types::{Digest, NodeIndex};
use super::view::TreeView;
use crate::hash::Algorithm;
use crate::{MerkleError, MerkleResult};

/// Immutable Merkle tree stored as a flat node arena.
///
/// Leaves occupy the arena in their construction order; internal nodes follow
/// and the root, when present, is the last node created.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    algorithm: Algorithm,
    nodes: Vec<MerkleNode>,
    leaves: Vec<NodeIndex>,
    root: Option<NodeIndex>,
}

impl MerkleTree {
    /// Builds a tree over `items` in order, retaining every payload.
    ///
    /// Adjacent nodes are paired left to right; a level with an odd count
    /// carries its last node up unchanged.
    pub fn from_leaves<I, T>(items: I, algorithm: Algorithm) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        TreeBuilder::new().algorithm(algorithm).from_leaves(items)
    }

    /// Builds the canonical tree of a key/value mapping.
    ///
    /// The root does not depend on the order of `entries`.
    pub fn from_dict<I, K, V>(entries: I, algorithm: Algorithm, format: DictFormat) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DictValue>,
    {
        TreeBuilder::new()
            .algorithm(algorithm)
            .from_dict(entries, format)
    }

    /// Tree without leaves.
    pub fn empty(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            nodes: Vec::new(),
            leaves: Vec::new(),
            root: None,
        }
    }

    /// Assembles a tree from parts whose consistency the caller has checked.
    pub(crate) fn from_parts(
        algorithm: Algorithm,
        nodes: Vec<MerkleNode>,
        leaves: Vec<NodeIndex>,
        root: Option<NodeIndex>,
    ) -> Self {
        Self {
            algorithm,
            nodes,
            leaves,
            root,
        }
    }

    /// Algorithm every node was hashed with.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Alias of [`MerkleTree::algorithm`].
    pub fn dtype(&self) -> Algorithm {
        self.algorithm
    }

    /// Root digest; fails on an empty tree.
    pub fn root(&self) -> MerkleResult<&Digest> {
        self.root_node().map(MerkleNode::digest)
    }

    /// Root node; fails on an empty tree.
    pub fn root_node(&self) -> MerkleResult<&MerkleNode> {
        self.root
            .and_then(|index| self.nodes.get(index))
            .ok_or(MerkleError::EmptyTree)
    }

    /// Arena index of the root, if any.
    pub fn root_index(&self) -> Option<NodeIndex> {
        self.root
    }

    /// Root digest as lowercase hex.
    pub fn hexroot(&self) -> MerkleResult<String> {
        self.root().map(Digest::to_hex)
    }

    /// Leaf nodes in construction order.
    pub fn leaves(&self) -> Vec<&MerkleNode> {
        self.leaves.iter().map(|&index| &self.nodes[index]).collect()
    }

    /// Arena indices of the leaves in construction order.
    pub fn leaf_indices(&self) -> &[NodeIndex] {
        &self.leaves
    }

    /// Leaf at `position` in construction order.
    pub fn leaf(&self, position: usize) -> MerkleResult<&MerkleNode> {
        self.leaves
            .get(position)
            .map(|&index| &self.nodes[index])
            .ok_or(MerkleError::IndexOutOfRange {
                index: position,
                len: self.leaves.len(),
            })
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Number of nodes, leaves and internal nodes together.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Slice-style access into the node arena.
    pub fn get<I>(&self, index: I) -> Option<&I::Output>
    where
        I: SliceIndex<[MerkleNode]>,
    {
        self.nodes.get(index)
    }

    /// Node at arena `index`.
    pub fn node(&self, index: NodeIndex) -> MerkleResult<&MerkleNode> {
        self.nodes.get(index).ok_or(MerkleError::IndexOutOfRange {
            index,
            len: self.nodes.len(),
        })
    }

    /// The whole node arena.
    pub fn nodes(&self) -> &[MerkleNode] {
        &self.nodes
    }

    /// Child nodes of the node at `index`, in hashing order.
    pub fn children(&self, index: NodeIndex) -> MerkleResult<Vec<&MerkleNode>> {
        let node = self.node(index)?;
        Ok(node
            .children()
            .iter()
            .map(|&child| &self.nodes[child])
            .collect())
    }

    /// Fresh breadth-first traversal starting at the root.
    pub fn iter(&self) -> BreadthFirst<'_> {
        BreadthFirst::new(&self.nodes, self.root)
    }

    /// Breadth-first traversal yielding arena indices instead of nodes.
    pub fn iter_idx(&self) -> BreadthFirstIndices<'_> {
        BreadthFirstIndices::new(&self.nodes, self.root)
    }

    /// Arena index of the first node equal to `node`.
    pub fn find(&self, node: &MerkleNode) -> Option<NodeIndex> {
        self.nodes.iter().position(|candidate| candidate == node)
    }

    /// Arena index of the first node matching `predicate`.
    pub fn find_by<F>(&self, predicate: F) -> Option<NodeIndex>
    where
        F: FnMut(&MerkleNode) -> bool,
    {
        self.nodes.iter().position(predicate)
    }

    /// Arena indices of every node matching `predicate`, in arena order.
    pub fn find_all<F>(&self, mut predicate: F) -> Vec<NodeIndex>
    where
        F: FnMut(&MerkleNode) -> bool,
    {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| predicate(node))
            .map(|(index, _)| index)
            .collect()
    }

    /// Read-only view of the sub-tree rooted at arena `index`.
    pub fn subtree_view(&self, index: NodeIndex) -> MerkleResult<TreeView<'_>> {
        self.node(index)?;
        Ok(TreeView::new(self, index))
    }

    /// View rooted at the first node equal to `node`, if the tree has one.
    pub fn subtree_from_node(&self, node: &MerkleNode) -> Option<TreeView<'_>> {
        self.find(node).map(|index| TreeView::new(self, index))
    }

    /// Opens an inclusion proof for the leaves at `indices`.
    pub fn generate_proof<I>(&self, indices: I) -> MerkleResult<MerkleProof>
    where
        I: IntoIterator<Item = usize>,
    {
        MerkleProof::generate(self, indices)
    }

    /// Writes the lines below `root`, depth first.
    fn render(&self, f: &mut fmt::Formatter<'_>, root: NodeIndex) -> fmt::Result {
        let push_children =
            |stack: &mut Vec<(NodeIndex, usize, bool)>, index: NodeIndex, depth: usize| {
                let children = self.nodes[index].children();
                for (position, &child) in children.iter().enumerate().rev() {
                    stack.push((child, depth, position + 1 == children.len()));
                }
            };
        // Continuation segment of every ancestor of the next line.
        let mut prefix: Vec<&str> = Vec::new();
        let mut stack = Vec::new();
        push_children(&mut stack, root, 0);
        while let Some((index, depth, last)) = stack.pop() {
            prefix.truncate(depth);
            let (connector, continuation) = if last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            for segment in &prefix {
                f.write_str(segment)?;
            }
            writeln!(f, "{connector}{}", self.nodes[index].short_hex())?;
            prefix.push(continuation);
            push_children(&mut stack, index, depth + 1);
        }
        Ok(())
    }
}

impl Index<NodeIndex> for MerkleTree {
    type Output = MerkleNode;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index]
    }
}

impl<'a> IntoIterator for &'a MerkleTree {
    type Item = &'a MerkleNode;
    type IntoIter = BreadthFirst<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for MerkleTree {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm
            && self.nodes.len() == other.nodes.len()
            && self.iter().eq(other.iter())
    }
}

impl Eq for MerkleTree {}

/// Depth-first ASCII rendering, one short digest label per line.
impl fmt::Display for MerkleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            None => writeln!(f, "<empty>"),
            Some(root) => {
                writeln!(f, "{}", self.nodes[root].short_hex())?;
                self.render(f, root)
            }
        }
    }
}
