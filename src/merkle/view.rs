use std::collections::BTreeMap;

use super::iter::{BreadthFirst, BreadthFirstIndices};
use super::node::MerkleNode;
use super::tree::MerkleTree;
use super::types::NodeIndex;

/// Borrowed sub-tree of a [`MerkleTree`] rooted at one of its nodes.
///
/// Indices stay those of the parent tree's arena. [`TreeView::to_tree`]
/// copies the sub-tree into a stand-alone tree with its own arena.
#[derive(Clone, Debug)]
pub struct TreeView<'a> {
    tree: &'a MerkleTree,
    root: NodeIndex,
    members: BTreeMap<NodeIndex, &'a MerkleNode>,
}

impl<'a> TreeView<'a> {
    /// Collects every node reachable from `root`; the caller checks the bound.
    pub(crate) fn new(tree: &'a MerkleTree, root: NodeIndex) -> Self {
        let nodes = tree.nodes();
        let members = BreadthFirstIndices::new(nodes, Some(root))
            .map(|index| (index, &nodes[index]))
            .collect();
        Self {
            tree,
            root,
            members,
        }
    }

    /// Node the view is rooted at.
    pub fn root(&self) -> &'a MerkleNode {
        &self.tree[self.root]
    }

    /// Arena index of the view's root in the parent tree.
    pub fn root_index(&self) -> NodeIndex {
        self.root
    }

    /// Number of nodes in the view, its root included.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false`: a view holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the parent-tree `index` lies inside the view.
    pub fn contains(&self, index: NodeIndex) -> bool {
        self.members.contains_key(&index)
    }

    /// Node at a parent-tree index, if it lies inside the view.
    pub fn get(&self, index: NodeIndex) -> Option<&'a MerkleNode> {
        self.members.get(&index).copied()
    }

    /// Leaves of the view, in the parent tree's leaf order.
    pub fn leaves(&self) -> Vec<&'a MerkleNode> {
        self.leaf_indices()
            .into_iter()
            .map(|index| &self.tree[index])
            .collect()
    }

    /// Parent-tree indices of the view's leaves, in leaf order.
    pub fn leaf_indices(&self) -> Vec<NodeIndex> {
        self.tree
            .leaf_indices()
            .iter()
            .copied()
            .filter(|index| self.contains(*index))
            .collect()
    }

    /// Breadth-first walk from the view's root.
    pub fn iter(&self) -> BreadthFirst<'a> {
        BreadthFirst::new(self.tree.nodes(), Some(self.root))
    }

    /// Breadth-first walk over parent-tree indices.
    pub fn iter_idx(&self) -> BreadthFirstIndices<'a> {
        BreadthFirstIndices::new(self.tree.nodes(), Some(self.root))
    }

    /// Copies the view into a tree of its own.
    ///
    /// Nodes keep their relative arena order, so the copy's root digest and
    /// leaf order match the view and proofs can be opened against it.
    pub fn to_tree(&self) -> MerkleTree {
        let algorithm = self.tree.algorithm();
        let renumbered: BTreeMap<NodeIndex, NodeIndex> = self
            .members
            .keys()
            .enumerate()
            .map(|(position, &index)| (index, position))
            .collect();
        let mut nodes: Vec<MerkleNode> = self
            .members
            .values()
            .map(|node| {
                if node.is_leaf() {
                    MerkleNode::hashed_leaf(
                        algorithm,
                        node.digest().clone(),
                        node.payload().map(<[u8]>::to_vec),
                    )
                } else {
                    let children = node
                        .children()
                        .iter()
                        .map(|child| renumbered[child])
                        .collect();
                    MerkleNode::internal(algorithm, node.digest().clone(), children)
                }
            })
            .collect();
        for index in 0..nodes.len() {
            let children = nodes[index].children().to_vec();
            for child in children {
                nodes[child].set_parent(index);
            }
        }
        let leaves = self
            .leaf_indices()
            .iter()
            .map(|index| renumbered[index])
            .collect();
        MerkleTree::from_parts(algorithm, nodes, leaves, Some(renumbered[&self.root]))
    }
}

impl<'a> IntoIterator for &TreeView<'a> {
    type Item = &'a MerkleNode;
    type IntoIter = BreadthFirst<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::hash::Algorithm;
    use crate::merkle::MerkleTree;

    fn tree() -> MerkleTree {
        MerkleTree::from_leaves(["a", "b", "c", "d", "e"], Algorithm::Sha256)
    }

    #[test]
    fn view_covers_descendants_only() {
        let tree = tree();
        // Node 6 joins leaves 2 and 3.
        let view = tree.subtree_view(6).unwrap();
        assert_eq!(view.len(), 3);
        assert_eq!(view.root(), &tree[6]);
        assert!(view.contains(2) && view.contains(3));
        assert!(view.get(0).is_none());
        assert_eq!(view.leaf_indices(), vec![2, 3]);
        assert_eq!(view.iter_idx().collect::<Vec<_>>(), vec![6, 2, 3]);
        assert_eq!((&view).into_iter().count(), 3);
    }

    #[test]
    fn copied_subtree_matches_a_fresh_build() {
        let tree = tree();
        let copy = tree.subtree_view(7).unwrap().to_tree();
        let fresh = MerkleTree::from_leaves(["a", "b", "c", "d"], Algorithm::Sha256);
        assert_eq!(copy, fresh);
        assert_eq!(copy.leaf_indices(), fresh.leaf_indices());
        assert_eq!(copy.root_index(), Some(6));
        assert_eq!(copy[0].parent(), Some(4));
        assert_eq!(copy.leaf(1).unwrap().payload(), Some(b"b".as_slice()));

        let proof = copy.generate_proof([2]).unwrap();
        assert!(proof.validate());
    }

    #[test]
    fn leaf_view_is_a_single_node() {
        let tree = tree();
        let view = tree.subtree_view(4).unwrap();
        assert_eq!(view.len(), 1);
        assert!(!view.is_empty());
        let copy = view.to_tree();
        assert_eq!(copy.len(), 1);
        assert_eq!(copy.root().unwrap(), tree[4].digest());
    }
}
