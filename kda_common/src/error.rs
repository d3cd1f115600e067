use crate::path::MAX_WIRE_DEPTH;

/// Possible errors when parsing or decoding a [`crate::DerivationPath`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Derivation path is empty")]
    Empty,

    #[error("Invalid path segment '{0}': expected a base-10 index optionally followed by ' or h")]
    InvalidSegment(String),

    #[error("Path segment '{0}' does not fit in 31 bits")]
    IndexOutOfRange(String),

    #[error("Binary path has {0} segments, at most {max} are supported", max = MAX_WIRE_DEPTH)]
    TooDeep(usize),

    #[error("Binary path is truncated: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    #[error("Binary path has {0} unexpected trailing bytes")]
    TrailingBytes(usize),
}

/// Possible errors when parsing a [`crate::PublicKey`] from its hex form
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PublicKeyError {
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),

    #[error("Public key must be 32 bytes, got {0}")]
    InvalidLength(usize),
}
