//! Encrypted document payload: `IV || CBC ciphertext`.

use crate::error::{CryptoError, CryptoResult};

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// CBC initialization vector size in bytes.
pub const IV_SIZE: usize = 16;

/// Ciphertext of a document, with the IV it was encrypted under as prefix.
///
/// The wire form has no header, version tag, or length prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedPayload {
    bytes: Vec<u8>,
}

impl EncryptedPayload {
    pub(crate) fn new(iv: [u8; IV_SIZE], ciphertext: Vec<u8>) -> Self {
        let mut bytes = Vec::with_capacity(IV_SIZE + ciphertext.len());
        bytes.extend_from_slice(&iv);
        bytes.extend_from_slice(&ciphertext);
        Self { bytes }
    }

    /// Parses a payload, checking only its shape.
    ///
    /// The blob must hold at least the IV, and the remainder must be a whole
    /// number of cipher blocks.
    pub fn from_bytes(blob: &[u8]) -> CryptoResult<Self> {
        if blob.len() < IV_SIZE {
            return Err(CryptoError::Format(format!(
                "payload is {} bytes, shorter than the {IV_SIZE}-byte IV",
                blob.len()
            )));
        }
        let body = blob.len() - IV_SIZE;
        if !body.is_multiple_of(BLOCK_SIZE) {
            return Err(CryptoError::Format(format!(
                "ciphertext length {body} is not a multiple of {BLOCK_SIZE}"
            )));
        }
        Ok(Self {
            bytes: blob.to_vec(),
        })
    }

    /// The IV transmitted with the ciphertext.
    pub fn iv(&self) -> [u8; IV_SIZE] {
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&self.bytes[..IV_SIZE]);
        iv
    }

    /// The CBC ciphertext following the IV.
    pub fn ciphertext(&self) -> &[u8] {
        &self.bytes[IV_SIZE..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Total size in bytes, IV included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Payload size for a plaintext of `plaintext_len` bytes.
    pub fn expected_len(plaintext_len: usize) -> usize {
        IV_SIZE + (plaintext_len / BLOCK_SIZE + 1) * BLOCK_SIZE
    }
}

impl AsRef<[u8]> for EncryptedPayload {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
