#![cfg(feature = "parallel")]

use merkle_engine::{Algorithm, Digest, MerkleTree, TreeBuilder};

fn items(count: usize) -> Vec<Vec<u8>> {
    (0..count).map(|i| format!("item-{i}").into_bytes()).collect()
}

/// Level-wise fold over serially hashed leaves.
fn serial_root(algorithm: Algorithm, items: &[Vec<u8>]) -> Digest {
    let mut level: Vec<Digest> = items.iter().map(|item| algorithm.digest(item)).collect();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => {
                    let mut hasher = algorithm.hasher();
                    hasher.update(left.as_bytes());
                    hasher.update(right.as_bytes());
                    hasher.finalize()
                }
                [carried] => carried.clone(),
                _ => unreachable!("chunks of two"),
            })
            .collect();
    }
    level.remove(0)
}

#[test]
fn parallel_leaf_hashing_matches_sequential() {
    let items = items(1_000);
    for algorithm in [Algorithm::Sha1, Algorithm::Keccak256, Algorithm::Blake2b] {
        let tree = MerkleTree::from_leaves(&items, algorithm);
        assert_eq!(tree.leaf_count(), items.len());
        for (leaf, item) in tree.leaves().iter().zip(&items) {
            assert_eq!(*leaf.digest(), algorithm.digest(item));
        }
        assert_eq!(*tree.root().unwrap(), serial_root(algorithm, &items));
    }
}

#[test]
fn payload_retention_keeps_parallel_roots() {
    let items = items(777);
    let builder = TreeBuilder::new().algorithm(Algorithm::Sha256);
    let first = builder.from_leaves(&items);
    let second = builder.retain_payloads(false).from_leaves(&items);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2 * items.len() - 1);
}
