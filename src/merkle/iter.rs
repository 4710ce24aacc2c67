use std::collections::VecDeque;
use std::iter::FusedIterator;

use super::node::MerkleNode;
use super::types::NodeIndex;

/// Breadth-first walk over arena indices, root first, children left to
/// right.
#[derive(Clone, Debug)]
pub struct BreadthFirstIndices<'a> {
    nodes: &'a [MerkleNode],
    queue: VecDeque<NodeIndex>,
}

impl<'a> BreadthFirstIndices<'a> {
    pub(crate) fn new(nodes: &'a [MerkleNode], root: Option<NodeIndex>) -> Self {
        Self {
            nodes,
            queue: root.into_iter().collect(),
        }
    }
}

impl Iterator for BreadthFirstIndices<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.queue.pop_front()?;
        let node = self.nodes.get(index)?;
        self.queue.extend(node.children().iter().copied());
        Some(index)
    }
}

impl FusedIterator for BreadthFirstIndices<'_> {}

/// Breadth-first walk over a tree, root first, children left to right.
#[derive(Clone, Debug)]
pub struct BreadthFirst<'a> {
    nodes: &'a [MerkleNode],
    indices: BreadthFirstIndices<'a>,
}

impl<'a> BreadthFirst<'a> {
    pub(crate) fn new(nodes: &'a [MerkleNode], root: Option<NodeIndex>) -> Self {
        Self {
            nodes,
            indices: BreadthFirstIndices::new(nodes, root),
        }
    }
}

impl<'a> Iterator for BreadthFirst<'a> {
    type Item = &'a MerkleNode;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;
        self.nodes.get(index)
    }
}

impl FusedIterator for BreadthFirst<'_> {}
