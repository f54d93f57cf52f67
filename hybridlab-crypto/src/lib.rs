//! Hybrid encryption core for hybridlab.
//!
//! Documents are encrypted with a symmetric key, and the symmetric key is
//! encrypted with an RSA public key:
//! - RSA (2048 bits and up, e = 65537) key pairs stored as PEM
//! - RSA-OAEP with SHA-256 for wrapping the symmetric key
//! - AES-128/192/256 in CBC mode with PKCS#7 padding for documents
//!
//! # Architecture
//!
//! The encryption uses a two-tier key system:
//!
//! 1. **Key pair**: Generated once per store and shared by every symmetric
//!    key size. The private half only leaves memory as the bytes of its PEM
//!    file. Rotating the pair re-wraps the stored symmetric keys.
//!
//! 2. **Symmetric key**: A random AES key, persisted only in wrapped form.
//!    It is unwrapped into memory for each document operation and zeroized
//!    when dropped.
//!
//! Ciphertext is `IV || CBC ciphertext`, with a fresh random IV per
//! encryption. Decryption reads the IV back from that prefix.

pub mod asymmetric;
mod error;
pub mod keystore;
pub mod padding;
pub mod payload;
pub mod service;
pub mod symmetric;
pub mod wrap;

pub use asymmetric::{
    KeyPair, MIN_MODULUS_BITS, deserialize_private, deserialize_public, fingerprint,
    generate_key_pair, serialize_private, serialize_public,
};
pub use error::{CryptoError, CryptoResult};
pub use keystore::{FileKeyStore, KeyStore, MemoryKeyStore, write_atomic, write_atomic_private};
pub use payload::{BLOCK_SIZE, EncryptedPayload, IV_SIZE};
pub use service::{HybridEncryptionService, KeyBundle, KeyBundleInfo, KeyRotation};
pub use symmetric::{KeySize, SymmetricKey, decrypt, decrypt_bytes, encrypt, generate_key};
pub use wrap::{WrappedKey, rewrap, unwrap, unwrap_key, wrap, wrap_key};

/// Re-exported so callers can name key types without depending on `rsa`.
pub use rsa::{RsaPrivateKey, RsaPublicKey};
