use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::hasher::DigestAlgorithm;
use crate::merkle::Digest;
use crate::MerkleError;

/// Closed set of digest algorithms the engine guarantees.
///
/// Identity is by name: two values naming the same algorithm are
/// interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    /// SHA-1 (20 bytes).
    #[default]
    Sha1,
    /// SHA-224 (28 bytes).
    Sha224,
    /// SHA-256 (32 bytes).
    Sha256,
    /// SHA-384 (48 bytes).
    Sha384,
    /// SHA-512 (64 bytes).
    Sha512,
    /// Keccak-224 with the original `0x01` padding (28 bytes).
    Keccak224,
    /// Keccak-256 with the original `0x01` padding (32 bytes).
    Keccak256,
    /// Keccak-384 with the original `0x01` padding (48 bytes).
    Keccak384,
    /// Keccak-512 with the original `0x01` padding (64 bytes).
    Keccak512,
    /// BLAKE2s-256 (32 bytes).
    Blake2s,
    /// BLAKE2b-512 (64 bytes).
    Blake2b,
}

/// Name → constructor table backing [`Algorithm::from_name`].
///
/// Canonical names come first in [`Algorithm::ALL`] order; aliases are only
/// accepted on input and never produced.
static REGISTRY: Lazy<BTreeMap<&'static str, fn() -> DigestAlgorithm>> = Lazy::new(|| {
    let mut registry: BTreeMap<&'static str, fn() -> DigestAlgorithm> = BTreeMap::new();
    registry.insert("sha1", || DigestAlgorithm::from(Algorithm::Sha1));
    registry.insert("sha-1", || DigestAlgorithm::from(Algorithm::Sha1));
    registry.insert("sha224", || DigestAlgorithm::from(Algorithm::Sha224));
    registry.insert("sha-224", || DigestAlgorithm::from(Algorithm::Sha224));
    registry.insert("sha256", || DigestAlgorithm::from(Algorithm::Sha256));
    registry.insert("sha-256", || DigestAlgorithm::from(Algorithm::Sha256));
    registry.insert("sha384", || DigestAlgorithm::from(Algorithm::Sha384));
    registry.insert("sha-384", || DigestAlgorithm::from(Algorithm::Sha384));
    registry.insert("sha512", || DigestAlgorithm::from(Algorithm::Sha512));
    registry.insert("sha-512", || DigestAlgorithm::from(Algorithm::Sha512));
    registry.insert("keccak224", || DigestAlgorithm::from(Algorithm::Keccak224));
    registry.insert("keccak256", || DigestAlgorithm::from(Algorithm::Keccak256));
    registry.insert("keccak384", || DigestAlgorithm::from(Algorithm::Keccak384));
    registry.insert("keccak512", || DigestAlgorithm::from(Algorithm::Keccak512));
    registry.insert("blake2s", || DigestAlgorithm::from(Algorithm::Blake2s));
    registry.insert("blake2s256", || DigestAlgorithm::from(Algorithm::Blake2s));
    registry.insert("blake2b", || DigestAlgorithm::from(Algorithm::Blake2b));
    registry.insert("blake2b512", || DigestAlgorithm::from(Algorithm::Blake2b));
    registry
});

impl Algorithm {
    /// Every guaranteed algorithm in registry order.
    pub const ALL: [Algorithm; 11] = [
        Algorithm::Sha1,
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
        Algorithm::Keccak224,
        Algorithm::Keccak256,
        Algorithm::Keccak384,
        Algorithm::Keccak512,
        Algorithm::Blake2s,
        Algorithm::Blake2b,
    ];

    /// Canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
            Algorithm::Keccak224 => "keccak224",
            Algorithm::Keccak256 => "keccak256",
            Algorithm::Keccak384 => "keccak384",
            Algorithm::Keccak512 => "keccak512",
            Algorithm::Blake2s => "blake2s",
            Algorithm::Blake2b => "blake2b",
        }
    }

    /// Fixed output length in bytes.
    pub const fn digest_size(self) -> usize {
        match self {
            Algorithm::Sha1 => 20,
            Algorithm::Sha224 | Algorithm::Keccak224 => 28,
            Algorithm::Sha256 | Algorithm::Keccak256 | Algorithm::Blake2s => 32,
            Algorithm::Sha384 | Algorithm::Keccak384 => 48,
            Algorithm::Sha512 | Algorithm::Keccak512 | Algorithm::Blake2b => 64,
        }
    }

    /// Resolves a (case-insensitive) name or alias.
    pub fn from_name(name: &str) -> Result<Self, MerkleError> {
        let lowered = name.trim().to_ascii_lowercase();
        REGISTRY
            .get(lowered.as_str())
            .map(|constructor| constructor().algorithm())
            .ok_or_else(|| MerkleError::UnsupportedAlgorithm {
                name: name.to_string(),
            })
    }

    /// Creates a fresh incremental hasher.
    pub fn hasher(self) -> DigestAlgorithm {
        DigestAlgorithm::from(self)
    }

    /// One-shot digest of `data`.
    pub fn digest(self, data: impl AsRef<[u8]>) -> Digest {
        let mut hasher = self.hasher();
        hasher.update(data.as_ref());
        hasher.finalize()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = MerkleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::from_name(s)
    }
}

impl TryFrom<String> for Algorithm {
    type Error = MerkleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Algorithm::from_name(&value)
    }
}

impl From<Algorithm> for String {
    fn from(value: Algorithm) -> Self {
        value.name().to_string()
    }
}

/// Canonical names of the guaranteed algorithm set.
pub fn algorithms_guaranteed() -> Vec<&'static str> {
    Algorithm::ALL.iter().map(|algorithm| algorithm.name()).collect()
}

/// Canonical names of the algorithms available at runtime.
///
/// There are no optional back-ends, so this is always the guaranteed set.
pub fn algorithms_available() -> Vec<&'static str> {
    algorithms_guaranteed()
}
