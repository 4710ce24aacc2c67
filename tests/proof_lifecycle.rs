use merkle_engine::{
    Algorithm, Codec, DictFormat, DictValue, Encoding, MerkleError, MerkleProof, MerkleTree,
    ProofError, Side, Slot,
};
use proptest::prelude::*;

fn items(count: usize) -> Vec<Vec<u8>> {
    (0..count).map(|i| format!("item-{i}").into_bytes()).collect()
}

#[test]
fn tamper_update_and_refresh() {
    let tree = MerkleTree::from_leaves(["data1", "data2"], Algorithm::Sha256);
    let mut proof = tree.generate_proof([1]).unwrap();
    assert!(proof.validate());
    assert_eq!(proof.expected(), tree.root().unwrap());

    proof.update(["tampered"]).unwrap();
    assert!(!proof.validate());
    assert_eq!(proof.leaves()[0].payload(), Some(b"tampered".as_slice()));
    assert_eq!(proof.original_leaves()[0].payload(), Some(b"data2".as_slice()));

    proof.refresh();
    assert!(proof.validate());
}

#[test]
fn restoring_the_same_value_validates() {
    let tree = MerkleTree::from_leaves(items(7), Algorithm::Keccak256);
    let mut proof = tree.generate_proof([5]).unwrap();
    proof.update(["something else"]).unwrap();
    assert!(!proof.validate());
    proof.update([items(7)[5].clone()]).unwrap();
    assert!(proof.validate());
}

#[test]
fn two_leaf_path_reads_as_one_sibling() {
    let tree = MerkleTree::from_leaves(["data1", "data2"], Algorithm::Sha256);
    let proof = tree.generate_proof([1]).unwrap();
    assert_eq!(proof.steps().len(), 1);
    let siblings = proof.steps()[0].siblings();
    assert_eq!(siblings, vec![(Side::Left, tree.leaf(0).unwrap().digest())]);
    assert_eq!(
        proof.steps()[0].slots(),
        &[Slot::Sibling(tree.leaf(0).unwrap().digest().clone()), Slot::Leaf(0)]
    );
}

#[test]
fn single_leaf_tree_has_empty_path() {
    let tree = MerkleTree::from_leaves(["alone"], Algorithm::Blake2b);
    let mut proof = tree.generate_proof([0]).unwrap();
    assert!(proof.steps().is_empty());
    assert!(proof.validate());
    proof.update(["intruder"]).unwrap();
    assert!(!proof.validate());
}

#[test]
fn generation_errors() {
    let empty = MerkleTree::empty(Algorithm::Sha1);
    assert_eq!(empty.generate_proof([0]).unwrap_err(), MerkleError::EmptyTree);

    let tree = MerkleTree::from_leaves(items(4), Algorithm::Sha1);
    assert_eq!(
        tree.generate_proof(Vec::new()).unwrap_err(),
        MerkleError::Proof(ProofError::NoLeaves)
    );
    assert_eq!(
        tree.generate_proof([1, 4]).unwrap_err(),
        MerkleError::IndexOutOfRange { index: 4, len: 4 }
    );
}

#[test]
fn update_requires_matching_count() {
    let tree = MerkleTree::from_leaves(items(4), Algorithm::Sha1);
    let mut proof = MerkleProof::generate(&tree, [0, 2]).unwrap();
    assert_eq!(
        proof.update(["only one"]).unwrap_err(),
        MerkleError::Proof(ProofError::LeafCountMismatch { expected: 2, got: 1 })
    );
    assert!(proof.validate());
}

#[test]
fn digests_can_replace_working_leaves() {
    let tree = MerkleTree::from_leaves(items(5), Algorithm::Sha224);
    let mut proof = tree.generate_proof([3]).unwrap();
    proof
        .update_digests([Algorithm::Sha224.digest(&items(5)[3])])
        .unwrap();
    assert!(proof.validate());
    assert!(proof.leaves()[0].payload().is_none());
}

#[test]
fn try_validate_reports_mismatching_root() {
    let tree = MerkleTree::from_leaves(items(3), Algorithm::Sha256);
    let mut proof = tree.generate_proof([0, 2]).unwrap();
    assert_eq!(proof.try_validate(), Ok(true));
    proof.update(["x", "y"]).unwrap();
    match proof.try_validate() {
        Err(MerkleError::Proof(ProofError::RootMismatch { expected, actual })) => {
            assert_eq!(&expected, tree.root().unwrap());
            assert_ne!(expected, actual);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn mapping_trees_prove_their_values() {
    let tree = MerkleTree::from_dict(
        [("a.a", "let"), ("a.b", "a"), ("a.c.b", "="), ("a.c.a", "1")],
        Algorithm::Sha1,
        DictFormat::Flatten,
    );
    let proof = tree.generate_proof([0, 3]).unwrap();
    assert!(proof.validate());
    assert_eq!(proof.expected_hex(), "34e31fe4180705565b3bb314ad56a3f513616e29");
    // Root has three children, the third being the "c" mapping.
    let root_step = proof.steps().last().unwrap();
    assert_eq!(root_step.slots().len(), 3);
    assert_eq!(root_step.slots()[0], Slot::Leaf(0));
    assert_eq!(root_step.slots()[2], Slot::Child);
}

#[test]
fn proofs_compare_by_content() {
    let tree = MerkleTree::from_leaves(items(6), Algorithm::Sha1);
    let a = tree.generate_proof([1, 4]).unwrap();
    let b = tree.generate_proof([4, 1, 4]).unwrap();
    assert_eq!(a, b);
    let mut c = b.clone();
    c.update([b"x".to_vec(), b"y".to_vec()]).unwrap();
    assert_ne!(a, c);
    c.refresh();
    assert_eq!(a, c);
}

/// Mapping nested `depth` levels deep; every level holds one value next to
/// the next level, so each internal node has a leaf and an internal child.
fn chain(depth: usize) -> DictValue {
    let mut value = DictValue::from("end");
    for level in 0..depth {
        value = DictValue::map([("leaf", DictValue::from(level.to_string())), ("next", value)]);
    }
    value
}

#[test]
fn deep_chains_prove_and_reload() {
    const DEPTH: usize = 20_000;
    let tree = MerkleTree::from_dict(
        [("chain", chain(DEPTH))],
        Algorithm::Sha1,
        DictFormat::Nested,
    );
    assert_eq!(tree.len(), 2 * DEPTH + 1);
    let deepest = tree
        .leaves()
        .iter()
        .position(|leaf| leaf.payload() == Some(b"end".as_slice()))
        .unwrap();

    let proof = tree.generate_proof([deepest]).unwrap();
    assert_eq!(proof.steps().len(), DEPTH);
    assert!(proof.validate());

    let reloaded =
        MerkleTree::loads(&tree.dumps(Encoding::Json).unwrap(), Encoding::Json, None).unwrap();
    assert_eq!(reloaded, tree);
    let reopened = reloaded.generate_proof([deepest]).unwrap();
    let bytes = reopened.dumps(Encoding::Binary).unwrap();
    let decoded = MerkleProof::loads(&bytes, Encoding::Binary, None).unwrap();
    assert_eq!(decoded, proof);
    assert!(decoded.validate());
}

proptest! {
    #[test]
    fn generated_proofs_validate(
        count in 1usize..48,
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..8),
    ) {
        let leaves = items(count);
        let tree = MerkleTree::from_leaves(&leaves, Algorithm::Sha256);
        let indices: Vec<usize> = picks.iter().map(|pick| pick.index(count)).collect();
        let proof = tree.generate_proof(indices.iter().copied()).unwrap();
        prop_assert!(proof.validate());
        prop_assert!(proof.indices().windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn any_tampered_leaf_is_detected(
        count in 2usize..48,
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..8),
        victim in any::<prop::sample::Index>(),
    ) {
        let leaves = items(count);
        let tree = MerkleTree::from_leaves(&leaves, Algorithm::Keccak256);
        let indices: Vec<usize> = picks.iter().map(|pick| pick.index(count)).collect();
        let mut proof = tree.generate_proof(indices).unwrap();
        let target = victim.index(proof.indices().len());
        let mut values: Vec<Vec<u8>> = proof
            .indices()
            .iter()
            .map(|&index| leaves[index].clone())
            .collect();
        values[target].push(b'!');
        proof.update(&values).unwrap();
        prop_assert!(!proof.validate());
        proof.refresh();
        prop_assert!(proof.validate());
    }
}
