use insta::assert_snapshot;
use merkle_engine::{
    Algorithm, Codec, DictFormat, Encoding, MerkleError, MerkleProof, MerkleTree, SerError,
    SerKind,
};
use proptest::prelude::*;

const SINGLE_LEAF_JSON: &str = r#"{"version":1,"algorithm":"sha1","root":0,"leaves":[0],"nodes":[{"digest":"11f6ad8ec52a2984abaafd7c3b516503785c2072","payload":"78"}]}"#;

fn sample_tree() -> MerkleTree {
    MerkleTree::from_leaves(["data1", "data2"], Algorithm::Sha256)
}

fn both_encodings() -> [Encoding; 2] {
    [Encoding::Json, Encoding::Binary]
}

#[test]
fn trees_round_trip_in_both_encodings() {
    let tree = sample_tree();
    for encoding in both_encodings() {
        let bytes = tree.dumps(encoding).unwrap();
        let restored = MerkleTree::loads(&bytes, encoding, None).unwrap();
        assert_eq!(restored, tree, "{encoding}");
        assert_eq!(restored.leaf(1).unwrap().payload(), Some(b"data2".as_slice()));
        assert_eq!(restored.leaf_indices(), tree.leaf_indices());
    }
}

#[test]
fn proofs_round_trip_in_both_encodings() {
    let tree = sample_tree();
    let proof = tree.generate_proof([1]).unwrap();
    for encoding in both_encodings() {
        let bytes = proof.dumps(encoding).unwrap();
        let restored = MerkleProof::loads(&bytes, encoding, Some(Algorithm::Sha256)).unwrap();
        assert_eq!(restored, proof, "{encoding}");
        assert!(restored.validate());
    }
}

#[test]
fn tampered_proof_keeps_its_state_through_encoding() {
    let tree = sample_tree();
    let mut proof = tree.generate_proof([1]).unwrap();
    proof.update(["tampered"]).unwrap();
    for encoding in both_encodings() {
        let bytes = proof.dumps(encoding).unwrap();
        let mut restored = MerkleProof::loads(&bytes, encoding, None).unwrap();
        assert_eq!(restored, proof);
        assert!(!restored.validate());
        restored.refresh();
        assert!(restored.validate());
    }
}

#[test]
fn mapping_trees_round_trip() {
    let tree = MerkleTree::from_dict(
        [("a.a", "let"), ("a.b", "a"), ("a.c.b", "="), ("a.c.a", "1")],
        Algorithm::Sha1,
        DictFormat::Flatten,
    );
    for encoding in both_encodings() {
        let restored = MerkleTree::loads(&tree.dumps(encoding).unwrap(), encoding, None).unwrap();
        assert_eq!(restored, tree);
        assert_eq!(restored.root_node().unwrap().children(), &[0, 1, 4]);
    }
}

#[test]
fn empty_tree_round_trips() {
    let tree = MerkleTree::empty(Algorithm::Keccak384);
    assert_eq!(
        tree.to_json().unwrap(),
        r#"{"version":1,"algorithm":"keccak384","root":null,"leaves":[],"nodes":[]}"#
    );
    for encoding in both_encodings() {
        let restored = MerkleTree::loads(&tree.dumps(encoding).unwrap(), encoding, None).unwrap();
        assert!(restored.is_empty());
        assert_eq!(restored.algorithm(), Algorithm::Keccak384);
    }
}

#[test]
fn single_leaf_tree_layouts() {
    let tree = MerkleTree::from_leaves(["x"], Algorithm::Sha1);
    assert_eq!(tree.to_json().unwrap(), SINGLE_LEAF_JSON);
    let encoded = hex::encode(tree.to_bytes().unwrap());
    assert_snapshot!(
        encoded,
        @"0100010400000073686131010000000001000000000000000100000011f6ad8ec52a2984abaafd7c3b516503785c207201010000007800000000"
    );
    assert_eq!(MerkleTree::from_json(SINGLE_LEAF_JSON).unwrap(), tree);
}

#[test]
fn truncated_binary_is_rejected() {
    let bytes = sample_tree().to_bytes().unwrap();
    for cut in [0, 2, 10, bytes.len() - 1] {
        let result = MerkleTree::loads(&bytes[..cut], Encoding::Binary, Some(Algorithm::Sha256));
        assert!(
            matches!(result, Err(MerkleError::Serde(SerError::UnexpectedEnd { .. }))),
            "cut at {cut}: {result:?}"
        );
    }
}

#[test]
fn trailing_bytes_are_rejected() {
    let tree = MerkleTree::from_leaves(["x"], Algorithm::Sha1);
    let mut bytes = tree.to_bytes().unwrap();
    let consumed = bytes.len();
    bytes.extend_from_slice(&[0, 0]);
    assert_eq!(
        MerkleTree::loads(&bytes, Encoding::Binary, Some(Algorithm::Sha1)).unwrap_err(),
        MerkleError::Serde(SerError::TrailingBytes {
            kind: SerKind::Tree,
            consumed,
            remaining: 2,
        })
    );
}

#[test]
fn unknown_versions_are_rejected() {
    let json = SINGLE_LEAF_JSON.replace("\"version\":1", "\"version\":7");
    assert_eq!(
        MerkleTree::from_json(&json).unwrap_err(),
        MerkleError::Serde(SerError::UnsupportedVersion {
            kind: SerKind::Tree,
            found: 7,
        })
    );

    let mut bytes = MerkleTree::from_leaves(["x"], Algorithm::Sha1).to_bytes().unwrap();
    bytes[0] = 7;
    assert_eq!(
        MerkleTree::from_bytes(&bytes).unwrap_err(),
        MerkleError::Serde(SerError::UnsupportedVersion {
            kind: SerKind::Header,
            found: 7,
        })
    );
}

#[test]
fn edited_payload_fails_integrity_checks() {
    let json = SINGLE_LEAF_JSON.replace("\"payload\":\"78\"", "\"payload\":\"79\"");
    assert_eq!(
        MerkleTree::from_json(&json).unwrap_err(),
        MerkleError::Serde(SerError::Inconsistent {
            kind: SerKind::Node,
            reason: "payload does not hash to its digest",
        })
    );
}

#[test]
fn malformed_json_is_reported() {
    for text in ["", "not json", "{\"version\":1}", "[1, 2, 3]"] {
        assert!(
            matches!(
                MerkleTree::from_json(text),
                Err(MerkleError::Serde(SerError::Json { kind: SerKind::Tree, .. }))
            ),
            "{text:?}"
        );
    }
    let extra = SINGLE_LEAF_JSON.replacen('{', "{\"extra\":true,", 1);
    assert!(MerkleTree::from_json(&extra).is_err());
}

#[test]
fn tree_payload_is_not_a_proof() {
    let bytes = sample_tree().to_bytes().unwrap();
    assert_eq!(
        MerkleProof::from_bytes(&bytes).unwrap_err(),
        MerkleError::Serde(SerError::InvalidValue {
            kind: SerKind::Header,
            field: "tag",
        })
    );
}

#[test]
fn requested_algorithm_is_enforced() {
    let proof = sample_tree().generate_proof([0]).unwrap();
    let bytes = proof.to_bytes().unwrap();
    assert_eq!(
        MerkleProof::loads(&bytes, Encoding::Binary, Some(Algorithm::Sha512)).unwrap_err(),
        MerkleError::Serde(SerError::AlgorithmMismatch {
            kind: SerKind::Proof,
            expected: "sha512".into(),
            got: "sha256".into(),
        })
    );
}

fn algorithms() -> impl Strategy<Value = Algorithm> {
    prop::sample::select(Algorithm::ALL.to_vec())
}

proptest! {
    #[test]
    fn random_trees_and_proofs_round_trip(
        algorithm in algorithms(),
        items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..24), 1..24),
        pick in any::<prop::sample::Index>(),
        binary in any::<bool>(),
    ) {
        let encoding = if binary { Encoding::Binary } else { Encoding::Json };
        let tree = MerkleTree::from_leaves(&items, algorithm);
        let restored = MerkleTree::loads(&tree.dumps(encoding).unwrap(), encoding, None).unwrap();
        prop_assert_eq!(&restored, &tree);

        let proof = tree.generate_proof([pick.index(items.len())]).unwrap();
        let bytes = proof.dumps(encoding).unwrap();
        let restored = MerkleProof::loads(&bytes, encoding, Some(algorithm)).unwrap();
        prop_assert!(restored.validate());
        prop_assert_eq!(restored, proof);
    }
}
