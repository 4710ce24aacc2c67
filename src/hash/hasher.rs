use core::fmt;

use blake2::{Blake2b512, Blake2s256};
use digest::Digest as _;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use sha3::{Keccak224, Keccak256, Keccak384, Keccak512};

use super::algorithm::Algorithm;
use crate::merkle::Digest;
use crate::MerkleError;

/// Running state of one concrete back-end.
#[derive(Clone)]
enum HasherState {
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Keccak224(Keccak224),
    Keccak256(Keccak256),
    Keccak384(Keccak384),
    Keccak512(Keccak512),
    Blake2s(Blake2s256),
    Blake2b(Blake2b512),
}

/// Dispatches `$body` over every back-end with `$state` bound to the hasher.
macro_rules! with_state {
    ($value:expr, $state:ident => $body:expr) => {
        match $value {
            HasherState::Sha1($state) => $body,
            HasherState::Sha224($state) => $body,
            HasherState::Sha256($state) => $body,
            HasherState::Sha384($state) => $body,
            HasherState::Sha512($state) => $body,
            HasherState::Keccak224($state) => $body,
            HasherState::Keccak256($state) => $body,
            HasherState::Keccak384($state) => $body,
            HasherState::Keccak512($state) => $body,
            HasherState::Blake2s($state) => $body,
            HasherState::Blake2b($state) => $body,
        }
    };
}

impl HasherState {
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Sha1 => HasherState::Sha1(Sha1::new()),
            Algorithm::Sha224 => HasherState::Sha224(Sha224::new()),
            Algorithm::Sha256 => HasherState::Sha256(Sha256::new()),
            Algorithm::Sha384 => HasherState::Sha384(Sha384::new()),
            Algorithm::Sha512 => HasherState::Sha512(Sha512::new()),
            Algorithm::Keccak224 => HasherState::Keccak224(Keccak224::new()),
            Algorithm::Keccak256 => HasherState::Keccak256(Keccak256::new()),
            Algorithm::Keccak384 => HasherState::Keccak384(Keccak384::new()),
            Algorithm::Keccak512 => HasherState::Keccak512(Keccak512::new()),
            Algorithm::Blake2s => HasherState::Blake2s(Blake2s256::new()),
            Algorithm::Blake2b => HasherState::Blake2b(Blake2b512::new()),
        }
    }
}

/// Incremental hasher over one [`Algorithm`].
///
/// Mirrors the familiar `update`/`finalize` streaming interface. The state is
/// cheap to create; [`DigestAlgorithm::finalize_reset`] allows reuse without
/// re-construction.
#[derive(Clone)]
pub struct DigestAlgorithm {
    algorithm: Algorithm,
    state: HasherState,
}

impl DigestAlgorithm {
    /// Creates a hasher from a (case-insensitive) algorithm name.
    pub fn new(name: &str) -> Result<Self, MerkleError> {
        Algorithm::from_name(name).map(Self::from)
    }

    /// Algorithm driving this hasher.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Output length in bytes.
    pub fn digest_size(&self) -> usize {
        self.algorithm.digest_size()
    }

    /// Absorbs additional bytes into the running state.
    pub fn update(&mut self, bytes: &[u8]) {
        with_state!(&mut self.state, state => state.update(bytes))
    }

    /// Consumes the hasher and returns the digest of everything absorbed.
    pub fn finalize(self) -> Digest {
        with_state!(self.state, state => Digest::new(state.finalize().to_vec()))
    }

    /// Returns the digest and resets the state for an independent computation.
    pub fn finalize_reset(&mut self) -> Digest {
        with_state!(&mut self.state, state => Digest::new(state.finalize_reset().to_vec()))
    }

    /// One-shot digest of `bytes`; the running state is left untouched.
    pub fn digest(&self, bytes: &[u8]) -> Digest {
        self.algorithm.digest(bytes)
    }
}

impl From<Algorithm> for DigestAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            state: HasherState::new(algorithm),
        }
    }
}

impl PartialEq for DigestAlgorithm {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm
    }
}

impl Eq for DigestAlgorithm {}

impl fmt::Debug for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestAlgorithm")
            .field("name", &self.name())
            .field("digest_size", &self.digest_size())
            .finish()
    }
}
