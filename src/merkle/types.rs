use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hash::Algorithm;

/// Position of a node inside its tree's node arena.
pub type NodeIndex = usize;

/// Owned digest bytes produced by one of the supported algorithms.
///
/// Textual payloads carry digests as lowercase hex strings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest {
    #[serde(with = "hex::serde")]
    bytes: Vec<u8>,
}

impl Digest {
    /// Creates a digest from raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Parses a digest from its hex representation.
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(hex_str).map(Self::new)
    }

    /// Returns a reference to the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the digest and returns the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of digest bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the digest holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest(0x")?;
        for byte in &self.bytes {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Position of a sibling relative to the path being proven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The sibling is hashed before the proven child.
    Left,
    /// The sibling is hashed after the proven child.
    Right,
}

/// Errors raised while building, mutating or checking a proof.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    /// No leaf indices were requested.
    #[error("no leaves selected for the proof")]
    NoLeaves,
    /// `update` received a different number of values than the proof covers.
    #[error("leaf count mismatch: expected {expected}, got {got}")]
    LeafCountMismatch {
        /// Number of leaves covered by the proof.
        expected: usize,
        /// Number of supplied values.
        got: usize,
    },
    /// The sibling path cannot be replayed.
    #[error("malformed proof path: {reason}")]
    MalformedPath {
        /// Which structural rule was violated.
        reason: &'static str,
    },
    /// The replayed path does not reproduce the captured root.
    #[error("root mismatch: expected {expected}, computed {actual}")]
    RootMismatch {
        /// Root captured at generation time.
        expected: Digest,
        /// Root obtained from the working leaves.
        actual: Digest,
    },
}

/// Digest integrity errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// A digest's length disagrees with its algorithm.
    #[error("{algorithm} digest must be {expected} bytes, got {got}")]
    DigestLength {
        /// Algorithm the digest was supplied for.
        algorithm: Algorithm,
        /// Output size of that algorithm.
        expected: usize,
        /// Supplied length.
        got: usize,
    },
    /// Two values that must share an algorithm do not.
    #[error("algorithm mismatch: expected {expected}, got {got}")]
    AlgorithmMismatch {
        /// Algorithm of the receiving value.
        expected: Algorithm,
        /// Algorithm of the supplied value.
        got: Algorithm,
    },
}

/// Checks that `digest` has the output length of `algorithm`.
pub(crate) fn ensure_digest_len(algorithm: Algorithm, digest: &Digest) -> Result<(), NodeError> {
    if digest.len() == algorithm.digest_size() {
        Ok(())
    } else {
        Err(NodeError::DigestLength {
            algorithm,
            expected: algorithm.digest_size(),
            got: digest.len(),
        })
    }
}
