//! Textual and binary interchange formats for trees and proofs.
//!
//! Every payload records [`FORMAT_VERSION`], the algorithm name, every digest
//! and the full structure, so `loads(dumps(x)) == x` holds for both
//! encodings. Loading re-verifies the payload: indices must be in range, the
//! parent/child structure must form a single tree, and every digest must
//! re-hash from its children or payload.
//!
//! ```
//! use merkle_engine::{Algorithm, Codec, Encoding, MerkleTree};
//!
//! let tree = MerkleTree::from_leaves(["data1", "data2"], Algorithm::Sha256);
//! let bytes = tree.dumps(Encoding::Binary).unwrap();
//! let restored = MerkleTree::loads(&bytes, Encoding::Binary, None).unwrap();
//! assert_eq!(restored, tree);
//! ```

mod binary;
mod json;
mod record;

use core::fmt;
use core::str::FromStr;

use tracing::trace;

use crate::hash::Algorithm;
use crate::merkle::{MerkleProof, MerkleTree};
use crate::ser::{ByteReader, SerError, SerKind, SerResult};
use crate::{MerkleError, MerkleResult};

use record::{check_version, ProofRecord, TreeRecord};

/// Version of the construction rules and payload layout.
pub const FORMAT_VERSION: u16 = 1;

/// Wire encoding selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// UTF-8 JSON text.
    #[default]
    Json,
    /// Compact little-endian framing.
    Binary,
}

impl Encoding {
    /// Lowercase name, also used by `Display`.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::Binary => "binary",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = SerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Encoding::Json),
            "binary" | "bin" => Ok(Encoding::Binary),
            _ => Err(SerError::invalid_value(SerKind::Header, "encoding")),
        }
    }
}

/// Serialization entry points shared by [`MerkleTree`] and [`MerkleProof`].
pub trait Codec: Sized {
    /// Encodes `self`; JSON output is UTF-8 text.
    fn dumps(&self, encoding: Encoding) -> MerkleResult<Vec<u8>>;

    /// Decodes a value.
    ///
    /// With `algorithm` set, the payload must name that algorithm. Without
    /// it, the algorithm named by the payload is tried first, then every
    /// registered algorithm in order; the first consistent decode wins.
    fn loads(bytes: &[u8], encoding: Encoding, algorithm: Option<Algorithm>)
        -> MerkleResult<Self>;

    fn to_json(&self) -> MerkleResult<String> {
        let bytes = self.dumps(Encoding::Json)?;
        String::from_utf8(bytes).map_err(|err| {
            MerkleError::from(SerError::Json {
                kind: SerKind::Header,
                message: err.to_string(),
            })
        })
    }

    fn from_json(text: &str) -> MerkleResult<Self> {
        Self::loads(text.as_bytes(), Encoding::Json, None)
    }

    fn to_bytes(&self) -> MerkleResult<Vec<u8>> {
        self.dumps(Encoding::Binary)
    }

    fn from_bytes(bytes: &[u8]) -> MerkleResult<Self> {
        Self::loads(bytes, Encoding::Binary, None)
    }
}

impl Codec for MerkleTree {
    fn dumps(&self, encoding: Encoding) -> MerkleResult<Vec<u8>> {
        let record = TreeRecord::from_tree(self)?;
        let bytes = match encoding {
            Encoding::Json => json::encode(&record, SerKind::Tree)?,
            Encoding::Binary => binary::encode_tree(&record, self.algorithm().digest_size())?,
        };
        Ok(bytes)
    }

    fn loads(
        bytes: &[u8],
        encoding: Encoding,
        algorithm: Option<Algorithm>,
    ) -> MerkleResult<Self> {
        match encoding {
            Encoding::Json => {
                let record: TreeRecord = json::decode(bytes, SerKind::Tree)?;
                check_version(record.version, SerKind::Tree)?;
                resolve(SerKind::Tree, &record.algorithm, algorithm, |candidate| {
                    record.to_tree(candidate)
                })
            }
            Encoding::Binary => {
                let named = binary::read_header(&mut ByteReader::new(bytes), binary::TREE_TAG)?;
                resolve(SerKind::Tree, &named, algorithm, |candidate| {
                    binary::decode_tree(bytes, candidate.digest_size())?.to_tree(candidate)
                })
            }
        }
    }
}

impl Codec for MerkleProof {
    fn dumps(&self, encoding: Encoding) -> MerkleResult<Vec<u8>> {
        let record = ProofRecord::from_proof(self)?;
        let bytes = match encoding {
            Encoding::Json => json::encode(&record, SerKind::Proof)?,
            Encoding::Binary => binary::encode_proof(&record, self.algorithm().digest_size())?,
        };
        Ok(bytes)
    }

    fn loads(
        bytes: &[u8],
        encoding: Encoding,
        algorithm: Option<Algorithm>,
    ) -> MerkleResult<Self> {
        match encoding {
            Encoding::Json => {
                let record: ProofRecord = json::decode(bytes, SerKind::Proof)?;
                check_version(record.version, SerKind::Proof)?;
                resolve(SerKind::Proof, &record.algorithm, algorithm, |candidate| {
                    record.to_proof(candidate)
                })
            }
            Encoding::Binary => {
                let named = binary::read_header(&mut ByteReader::new(bytes), binary::PROOF_TAG)?;
                resolve(SerKind::Proof, &named, algorithm, |candidate| {
                    binary::decode_proof(bytes, candidate.digest_size())?.to_proof(candidate)
                })
            }
        }
    }
}

/// Picks the algorithm a payload is decoded with.
///
/// When every candidate fails, the error of the algorithm named by the
/// payload is reported if that name is registered.
fn resolve<T, F>(
    kind: SerKind,
    named: &str,
    requested: Option<Algorithm>,
    mut attempt: F,
) -> MerkleResult<T>
where
    F: FnMut(Algorithm) -> SerResult<T>,
{
    let named_algorithm = Algorithm::from_name(named).ok();
    if let Some(requested) = requested {
        return if named_algorithm == Some(requested) {
            Ok(attempt(requested)?)
        } else {
            Err(SerError::AlgorithmMismatch {
                kind,
                expected: requested.name().to_string(),
                got: named.to_string(),
            }
            .into())
        };
    }

    let mut named_error = None;
    if let Some(candidate) = named_algorithm {
        match attempt(candidate) {
            Ok(value) => return Ok(value),
            Err(err) => named_error = Some(err),
        }
    }
    for candidate in Algorithm::ALL {
        if Some(candidate) == named_algorithm {
            continue;
        }
        match attempt(candidate) {
            Ok(value) => {
                trace!(
                    %kind,
                    named,
                    algorithm = %candidate,
                    "payload decoded with fallback algorithm"
                );
                return Ok(value);
            }
            Err(err) => {
                trace!(%kind, algorithm = %candidate, error = %err, "decode attempt failed")
            }
        }
    }
    Err(named_error
        .unwrap_or(SerError::NoMatchingAlgorithm { kind })
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_names_parse() {
        assert_eq!("JSON".parse::<Encoding>().unwrap(), Encoding::Json);
        assert_eq!("bin".parse::<Encoding>().unwrap(), Encoding::Binary);
        assert_eq!("binary".parse::<Encoding>().unwrap(), Encoding::Binary);
        assert!("yaml".parse::<Encoding>().is_err());
        assert_eq!(Encoding::Binary.to_string(), "binary");
    }

    #[test]
    fn explicit_algorithm_must_match_payload() {
        let tree = MerkleTree::from_leaves(["a", "b"], Algorithm::Sha256);
        let bytes = tree.dumps(Encoding::Json).unwrap();
        let err =
            MerkleTree::loads(&bytes, Encoding::Json, Some(Algorithm::Keccak256)).unwrap_err();
        assert_eq!(
            err,
            MerkleError::Serde(SerError::AlgorithmMismatch {
                kind: SerKind::Tree,
                expected: "keccak256".into(),
                got: "sha256".into(),
            })
        );
        let restored = MerkleTree::loads(&bytes, Encoding::Json, Some(Algorithm::Sha256)).unwrap();
        assert_eq!(restored, tree);
    }

    #[test]
    fn unknown_name_falls_back_to_registry() {
        let tree = MerkleTree::from_leaves(["a", "b", "c"], Algorithm::Blake2b);
        let json = tree.to_json().unwrap().replace("\"blake2b\"", "\"legacy-blake\"");
        let restored = MerkleTree::from_json(&json).unwrap();
        assert_eq!(restored, tree);
        assert_eq!(restored.algorithm(), Algorithm::Blake2b);
    }

    #[test]
    fn no_consistent_algorithm_is_reported() {
        let tree = MerkleTree::from_leaves(["a", "b"], Algorithm::Sha1);
        let json = tree.to_json().unwrap().replace("\"sha1\"", "\"mystery\"");
        // Break the root digest so no algorithm re-hashes it.
        let root = tree.hexroot().unwrap();
        let json = json.replace(&root, &"0".repeat(40));
        assert_eq!(
            MerkleTree::from_json(&json).unwrap_err(),
            MerkleError::Serde(SerError::NoMatchingAlgorithm { kind: SerKind::Tree })
        );
    }
}
