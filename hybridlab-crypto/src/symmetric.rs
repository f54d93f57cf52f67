//! AES-CBC document encryption with PKCS#7 padding.
//!
//! Every call to [`encrypt`] draws a fresh random IV and emits it as the
//! first 16 bytes of the payload. [`decrypt`] reads the IV back from that
//! prefix; it never generates one.

use crate::error::{CryptoError, CryptoResult};
use crate::padding::{pkcs7_pad, pkcs7_unpad};
use crate::payload::{BLOCK_SIZE, EncryptedPayload, IV_SIZE};
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256, Block};
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Supported AES key sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    pub const ALL: [KeySize; 3] = [KeySize::Aes128, KeySize::Aes192, KeySize::Aes256];

    /// Maps a bit length to a key size.
    pub fn from_bits(bits: usize) -> CryptoResult<Self> {
        match bits {
            128 => Ok(Self::Aes128),
            192 => Ok(Self::Aes192),
            256 => Ok(Self::Aes256),
            other => Err(CryptoError::InvalidKeySize(other)),
        }
    }

    pub fn bits(self) -> usize {
        self.bytes() * 8
    }

    pub fn bytes(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    fn from_len(len: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.bytes() == len)
    }
}

impl TryFrom<usize> for KeySize {
    type Error = CryptoError;

    fn try_from(bits: usize) -> CryptoResult<Self> {
        Self::from_bits(bits)
    }
}

impl From<KeySize> for usize {
    fn from(size: KeySize) -> usize {
        size.bits()
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AES-{}", self.bits())
    }
}

/// Raw AES key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    /// Builds a key from raw bytes, which must be 16, 24 or 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if KeySize::from_len(bytes.len()).is_none() {
            return Err(CryptoError::InvalidKeySize(bytes.len() * 8));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn size(&self) -> KeySize {
        // Length is validated at construction.
        KeySize::from_len(self.bytes.len()).unwrap_or(KeySize::Aes256)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

/// Generates a random symmetric key of the given size.
pub fn generate_key(size: KeySize) -> SymmetricKey {
    let mut bytes = vec![0u8; size.bytes()];
    rand::rng().fill_bytes(&mut bytes);
    SymmetricKey { bytes }
}

enum BlockCipher {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl BlockCipher {
    fn new(key: &SymmetricKey) -> CryptoResult<Self> {
        let bytes = key.as_bytes();
        let invalid = |_| CryptoError::InvalidKeySize(bytes.len() * 8);
        Ok(match key.size() {
            KeySize::Aes128 => Self::Aes128(Aes128::new_from_slice(bytes).map_err(invalid)?),
            KeySize::Aes192 => Self::Aes192(Aes192::new_from_slice(bytes).map_err(invalid)?),
            KeySize::Aes256 => Self::Aes256(Aes256::new_from_slice(bytes).map_err(invalid)?),
        })
    }

    fn encrypt_block(&self, block: &mut Block) {
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes192(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut Block) {
        match self {
            Self::Aes128(c) => c.decrypt_block(block),
            Self::Aes192(c) => c.decrypt_block(block),
            Self::Aes256(c) => c.decrypt_block(block),
        }
    }
}

/// Encrypts `plaintext` under a fresh random IV.
///
/// Output is `IV || AES-CBC(PKCS7(plaintext))`. Two calls with the same key
/// and plaintext produce different payloads.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> CryptoResult<EncryptedPayload> {
    let mut iv = [0u8; IV_SIZE];
    rand::rng().fill_bytes(&mut iv);
    encrypt_with_iv(key, &iv, plaintext)
}

/// Encrypts with a caller-chosen IV. Only [`encrypt`] is safe for general use.
pub(crate) fn encrypt_with_iv(
    key: &SymmetricKey,
    iv: &[u8; IV_SIZE],
    plaintext: &[u8],
) -> CryptoResult<EncryptedPayload> {
    let cipher = BlockCipher::new(key)?;
    let padded = pkcs7_pad(plaintext, BLOCK_SIZE);

    let mut ciphertext = Vec::with_capacity(padded.len());
    let mut prev = *iv;
    for chunk in padded.chunks_exact(BLOCK_SIZE) {
        let mut block = Block::default();
        for (out, (p, c)) in block.iter_mut().zip(chunk.iter().zip(prev.iter())) {
            *out = p ^ c;
        }
        cipher.encrypt_block(&mut block);
        prev.copy_from_slice(&block);
        ciphertext.extend_from_slice(&block);
    }

    Ok(EncryptedPayload::new(*iv, ciphertext))
}

/// Decrypts a payload using the IV carried in its prefix.
pub fn decrypt(key: &SymmetricKey, payload: &EncryptedPayload) -> CryptoResult<Vec<u8>> {
    let cipher = BlockCipher::new(key)?;
    let ciphertext = payload.ciphertext();

    let mut plaintext = Vec::with_capacity(ciphertext.len());
    let mut prev = payload.iv();
    for chunk in ciphertext.chunks_exact(BLOCK_SIZE) {
        let mut block = Block::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        plaintext.extend(block.iter().zip(prev.iter()).map(|(d, p)| d ^ p));
        prev.copy_from_slice(chunk);
    }

    let result = pkcs7_unpad(&plaintext, BLOCK_SIZE);
    plaintext.zeroize();
    result
}

/// Parses raw `IV || ciphertext` bytes, then decrypts them.
pub fn decrypt_bytes(key: &SymmetricKey, blob: &[u8]) -> CryptoResult<Vec<u8>> {
    let payload = EncryptedPayload::from_bytes(blob)?;
    decrypt(key, &payload)
}
