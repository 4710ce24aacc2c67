use core::fmt;

/// Context markers used when reporting serialization failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerKind {
    /// Version, object tag and algorithm name.
    Header,
    /// Tree framing: root, leaf list and node list.
    Tree,
    /// A single tree node.
    Node,
    /// Proof framing: indices, expected root and leaf buffers.
    Proof,
    /// A single step of a proof path.
    ProofStep,
    /// A proven leaf entry.
    ProofLeaf,
}

impl fmt::Display for SerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerKind::Header => write!(f, "header"),
            SerKind::Tree => write!(f, "tree"),
            SerKind::Node => write!(f, "node"),
            SerKind::Proof => write!(f, "proof"),
            SerKind::ProofStep => write!(f, "proof step"),
            SerKind::ProofLeaf => write!(f, "proof leaf"),
        }
    }
}

/// Failure while encoding or decoding a tree or proof payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerError {
    /// Input ended before the expected number of bytes were read.
    #[error("{kind}: unexpected end of input while reading `{field}`")]
    UnexpectedEnd {
        kind: SerKind,
        field: &'static str,
    },
    /// A length prefix exceeded the supported bounds or a size disagreed.
    #[error("{kind}: invalid length for `{field}`")]
    InvalidLength {
        kind: SerKind,
        field: &'static str,
    },
    /// Encountered an unexpected discriminant or malformed value.
    #[error("{kind}: invalid value for `{field}`")]
    InvalidValue {
        kind: SerKind,
        field: &'static str,
    },
    /// Additional bytes remained after consuming the expected payload.
    #[error("{kind}: {remaining} trailing bytes after offset {consumed}")]
    TrailingBytes {
        kind: SerKind,
        /// Offset at which decoding stopped.
        consumed: usize,
        remaining: usize,
    },
    /// The textual payload is not valid JSON for the expected record.
    #[error("{kind}: malformed json: {message}")]
    Json {
        kind: SerKind,
        /// Parser message.
        message: String,
    },
    /// The payload was produced by an unknown format version.
    #[error("{kind}: unsupported format version {found}")]
    UnsupportedVersion {
        kind: SerKind,
        /// Version found in the payload.
        found: u16,
    },
    /// The payload names a different algorithm than the one requested.
    #[error("{kind}: payload uses `{got}`, expected `{expected}`")]
    AlgorithmMismatch {
        kind: SerKind,
        /// Requested algorithm.
        expected: String,
        /// Algorithm named by the payload.
        got: String,
    },
    /// The payload decodes but describes an inconsistent structure.
    #[error("{kind}: inconsistent payload: {reason}")]
    Inconsistent {
        kind: SerKind,
        /// Which integrity rule was violated.
        reason: &'static str,
    },
    /// No registered algorithm decodes the payload consistently.
    #[error("{kind}: no registered algorithm matches the payload")]
    NoMatchingAlgorithm { kind: SerKind },
}

impl SerError {
    /// Input ended inside `field`.
    pub fn unexpected_end(kind: SerKind, field: &'static str) -> Self {
        SerError::UnexpectedEnd { kind, field }
    }

    /// Length or count of `field` is out of range.
    pub fn invalid_length(kind: SerKind, field: &'static str) -> Self {
        SerError::InvalidLength { kind, field }
    }

    /// `field` holds a value the layout does not allow.
    pub fn invalid_value(kind: SerKind, field: &'static str) -> Self {
        SerError::InvalidValue { kind, field }
    }

    /// Bytes left after a complete object.
    pub fn trailing_bytes(kind: SerKind, consumed: usize, remaining: usize) -> Self {
        SerError::TrailingBytes {
            kind,
            consumed,
            remaining,
        }
    }

    /// Decoded object fails an integrity check.
    pub fn inconsistent(kind: SerKind, reason: &'static str) -> Self {
        SerError::Inconsistent { kind, reason }
    }

    /// Section the failure was reported in.
    pub fn kind(&self) -> SerKind {
        match *self {
            SerError::UnexpectedEnd { kind, .. }
            | SerError::InvalidLength { kind, .. }
            | SerError::InvalidValue { kind, .. }
            | SerError::TrailingBytes { kind, .. }
            | SerError::Json { kind, .. }
            | SerError::UnsupportedVersion { kind, .. }
            | SerError::AlgorithmMismatch { kind, .. }
            | SerError::Inconsistent { kind, .. }
            | SerError::NoMatchingAlgorithm { kind } => kind,
        }
    }
}

/// Result of an encode or decode step.
pub type SerResult<T> = core::result::Result<T, SerError>;
