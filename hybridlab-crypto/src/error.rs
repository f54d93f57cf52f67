//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in hybrid encryption operations.
///
/// `Unwrap` and `Padding` deliberately carry no detail: every failure cause
/// maps to the same value and message.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("key serialization failed: {0}")]
    Serialization(String),

    #[error("invalid key material: {0}")]
    KeyFormat(String),

    #[error("key wrap failed: {0}")]
    Wrap(String),

    #[error("key unwrap failed")]
    Unwrap,

    #[error("malformed ciphertext: {0}")]
    Format(String),

    #[error("decryption failed (wrong key or corrupted data)")]
    Padding,

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("unsupported symmetric key size: {0} bits (expected 128, 192 or 256)")]
    InvalidKeySize(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document encryption failed: {0}")]
    DocumentEncrypt(#[source] Box<CryptoError>),

    #[error("document decryption failed: {0}")]
    DocumentDecrypt(#[source] Box<CryptoError>),
}

impl CryptoError {
    /// Short stable name of the error kind, for user-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyGeneration(_) => "key-generation",
            Self::Serialization(_) => "serialization",
            Self::KeyFormat(_) => "key-format",
            Self::Wrap(_) => "wrap",
            Self::Unwrap => "unwrap",
            Self::Format(_) => "format",
            Self::Padding => "padding",
            Self::InvalidKeyLength { .. } => "invalid-key-length",
            Self::InvalidKeySize(_) => "invalid-key-size",
            Self::Io(_) => "io",
            Self::DocumentEncrypt(_) => "document-encrypt",
            Self::DocumentDecrypt(_) => "document-decrypt",
        }
    }

    /// The innermost error of a document workflow failure.
    pub fn root_cause(&self) -> &CryptoError {
        match self {
            Self::DocumentEncrypt(inner) | Self::DocumentDecrypt(inner) => inner.root_cause(),
            other => other,
        }
    }
}
