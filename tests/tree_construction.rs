use insta::assert_snapshot;
use merkle_engine::{
    Algorithm, DictFormat, DictValue, MerkleError, MerkleNode, MerkleTree, TreeBuilder,
};
use proptest::prelude::*;

fn letters(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("leaf-{i}")).collect()
}

#[test]
fn construction_is_deterministic() {
    let first = MerkleTree::from_leaves(letters(13), Algorithm::Keccak256);
    let second = MerkleTree::from_leaves(letters(13), Algorithm::Keccak256);
    assert_eq!(first, second);
    assert_eq!(first.root().unwrap(), second.root().unwrap());
}

#[test]
fn single_leaf_is_its_own_root() {
    let tree = MerkleTree::from_leaves(["only"], Algorithm::Sha256);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.root().unwrap(), &Algorithm::Sha256.digest("only"));
    assert_eq!(tree.root_node().unwrap(), tree.leaf(0).unwrap());
}

#[test]
fn two_leaves_hash_their_concatenation() {
    let tree = MerkleTree::from_leaves(["data1", "data2"], Algorithm::Sha256);
    assert_eq!(tree.len(), 3);
    assert_eq!(
        tree.hexroot().unwrap(),
        "5b6d4b089e2331b3e00a803326df50cdc2df81c7df405abea149421df227640b"
    );
    let leaves = tree.leaves();
    assert_eq!(
        leaves[0].hexdigest(),
        "5b41362bc82b7f3d56edc5a306db22105707d01ff4819e26faef9724a2d406c9"
    );
    assert_eq!(
        leaves[1].hexdigest(),
        "d98cf53e0c8b77c14a96358d5b69584225b4bb9026423cbc2f7b0161894c402c"
    );
}

#[test]
fn odd_count_carries_the_last_leaf() {
    let tree = MerkleTree::from_leaves(["a", "b", "c"], Algorithm::Sha1);
    assert_eq!(
        tree.hexroot().unwrap(),
        "4a0b8c57a3505535f23424a368f51f47c485a395"
    );
}

#[test]
fn pretty_printer_walks_depth_first() {
    let tree = MerkleTree::from_leaves(["a", "b", "c", "d", "e"], Algorithm::Sha256);
    let rendered = tree.to_string();
    assert_snapshot!(rendered.trim_end(), @r"
    d71f8983
    ├── 14ede5e8
    │   ├── e5a01fee
    │   │   ├── ca978112
    │   │   └── 3e23e816
    │   └── bffe0b34
    │       ├── 2e7d2c03
    │       └── 18ac3e73
    └── 3f79bb7b
    ");
}

#[test]
fn empty_tree_has_no_root() {
    let tree = MerkleTree::from_leaves(Vec::<Vec<u8>>::new(), Algorithm::Sha1);
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.root(), Err(MerkleError::EmptyTree));
    assert_eq!(tree.hexroot(), Err(MerkleError::EmptyTree));
    assert_eq!(tree, MerkleTree::empty(Algorithm::Sha1));
    assert_ne!(tree, MerkleTree::empty(Algorithm::Sha256));
}

#[test]
fn equality_needs_matching_algorithm_and_shape() {
    let sha = MerkleTree::from_leaves(["a", "b"], Algorithm::Sha256);
    let keccak = MerkleTree::from_leaves(["a", "b"], Algorithm::Keccak256);
    assert_ne!(sha, keccak);
    let longer = MerkleTree::from_leaves(["a", "b", "c"], Algorithm::Sha256);
    assert_ne!(sha, longer);
}

#[test]
fn text_and_byte_items_agree() {
    let text = MerkleTree::from_leaves(["x", "y"], Algorithm::Blake2s);
    let bytes = MerkleTree::from_leaves([b"x".to_vec(), b"y".to_vec()], Algorithm::Blake2s);
    assert_eq!(text, bytes);
}

#[test]
fn iteration_is_breadth_first() {
    let tree = MerkleTree::from_leaves(["a", "b", "c"], Algorithm::Sha1);
    let labels: Vec<bool> = tree.iter().map(MerkleNode::is_leaf).collect();
    assert_eq!(labels, vec![false, false, true, true, true]);
    let via_ref: Vec<&MerkleNode> = (&tree).into_iter().collect();
    assert_eq!(via_ref.len(), tree.len());
}

#[test]
fn children_are_addressable() {
    let tree = MerkleTree::from_leaves(["a", "b"], Algorithm::Sha1);
    let root = tree.root_index().unwrap();
    let children = tree.children(root).unwrap();
    assert_eq!(children, vec![tree.leaf(0).unwrap(), tree.leaf(1).unwrap()]);
    assert!(tree.children(0).unwrap().is_empty());
    assert!(tree.children(9).is_err());
}

#[test]
fn builder_reads_algorithm_names() {
    let tree = TreeBuilder::new()
        .algorithm_name("Keccak512")
        .unwrap()
        .from_leaves(["a"]);
    assert_eq!(tree.dtype(), Algorithm::Keccak512);
    assert_eq!(tree.root().unwrap().len(), 64);
}

#[test]
fn deep_trees_render_without_recursion() {
    const DEPTH: usize = 1_500;
    let mut value = DictValue::from("end");
    for level in 0..DEPTH {
        value = DictValue::map([("leaf", DictValue::from(level.to_string())), ("next", value)]);
    }
    let tree = MerkleTree::from_dict([("chain", value)], Algorithm::Sha1, DictFormat::Nested);
    // A small stack leaves no room for one frame per level.
    let lines = std::thread::Builder::new()
        .stack_size(128 * 1024)
        .spawn(move || tree.to_string().lines().count())
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(lines, 2 * DEPTH + 1);
}

#[test]
fn index_walk_and_subtree_views() {
    let tree = MerkleTree::from_leaves(letters(6), Algorithm::Sha256);
    let order: Vec<_> = tree.iter_idx().collect();
    assert_eq!(order.len(), tree.len());
    assert_eq!(order[0], tree.root_index().unwrap());

    let internal = tree.find_all(|node| !node.is_leaf());
    assert_eq!(internal.len(), 5);
    for index in internal {
        let view = tree.subtree_view(index).unwrap();
        let copy = view.to_tree();
        assert_eq!(copy.root().unwrap(), tree[index].digest());
        assert_eq!(copy.leaf_count(), view.leaves().len());
        assert_eq!(copy.len(), view.len());
    }
    let first = tree.leaf(0).unwrap();
    assert_eq!(tree.subtree_from_node(first).unwrap().len(), 1);
}

proptest! {
    #[test]
    fn node_count_is_two_n_minus_one(count in 1usize..80) {
        let tree = MerkleTree::from_leaves(letters(count), Algorithm::Sha1);
        prop_assert_eq!(tree.len(), 2 * count - 1);
        prop_assert_eq!(tree.leaf_count(), count);
        prop_assert_eq!(tree.root_index(), Some(tree.len() - 1));
        prop_assert_eq!(tree.iter().count(), tree.len());
    }

    #[test]
    fn every_internal_digest_rehashes(items in prop::collection::vec(any::<Vec<u8>>(), 1..40)) {
        let tree = MerkleTree::from_leaves(&items, Algorithm::Sha256);
        for node in tree.nodes() {
            if node.is_leaf() {
                continue;
            }
            let mut hasher = Algorithm::Sha256.hasher();
            for &child in node.children() {
                hasher.update(tree[child].digest().as_bytes());
            }
            prop_assert_eq!(&hasher.finalize(), node.digest());
        }
    }
}
