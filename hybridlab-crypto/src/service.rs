//! Hybrid encryption workflows.
//!
//! # Process
//!
//! 1. `generate_keys`: random AES key wrapped under the stored RSA pair, or
//!    under a fresh pair when the store holds none. Every AES key size in a
//!    store shares one pair.
//! 2. `encrypt_document`: unwrap the AES key with the private key, then
//!    AES-CBC encrypt under a fresh IV.
//! 3. `decrypt_document`: unwrap the AES key, then AES-CBC decrypt with the
//!    IV carried in the payload.
//! 4. `rotate_key_pair`: replace the RSA pair and re-wrap every stored AES
//!    key under it.
//!
//! Each workflow either completes or returns an error; none of them carries
//! on with partially loaded key material.

use crate::asymmetric::{self, DEFAULT_MODULUS_BITS, KeyPair};
use crate::error::{CryptoError, CryptoResult};
use crate::keystore::KeyStore;
use crate::payload::EncryptedPayload;
use crate::symmetric::{self, KeySize, SymmetricKey};
use crate::wrap::{self, WrappedKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Everything produced by key generation.
#[derive(Clone)]
pub struct KeyBundle {
    pub key_pair: KeyPair,
    pub wrapped_key: WrappedKey,
    pub key_size: KeySize,
    /// Hex SHA-256 fingerprint of the public key the AES key is wrapped under.
    pub key_pair_id: String,
    /// When the bundle was generated, or loaded back from the store.
    pub created_at: DateTime<Utc>,
}

impl KeyBundle {
    /// Public description of the bundle, safe to print or log.
    pub fn info(&self) -> KeyBundleInfo {
        KeyBundleInfo {
            key_bits: self.key_size.bits(),
            modulus_bits: self.key_pair.modulus_bits(),
            key_pair_id: self.key_pair_id.clone(),
            wrapped_key_len: self.wrapped_key.len(),
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for KeyBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBundle")
            .field("key_pair", &self.key_pair)
            .field("key_size", &self.key_size)
            .field("key_pair_id", &self.key_pair_id)
            .field("wrapped_key_len", &self.wrapped_key.len())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Non-secret summary of a [`KeyBundle`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBundleInfo {
    pub key_bits: usize,
    pub modulus_bits: usize,
    pub key_pair_id: String,
    pub wrapped_key_len: usize,
    pub created_at: DateTime<Utc>,
}

/// Outcome of [`HybridEncryptionService::rotate_key_pair`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRotation {
    pub previous_key_pair_id: String,
    pub key_pair_id: String,
    /// Bit lengths of the AES keys re-wrapped under the new pair.
    pub rewrapped_key_bits: Vec<usize>,
}

/// Orchestrates key generation and document encryption over a key store.
pub struct HybridEncryptionService<S: KeyStore> {
    store: S,
    modulus_bits: usize,
}

impl<S: KeyStore> HybridEncryptionService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            modulus_bits: DEFAULT_MODULUS_BITS,
        }
    }

    /// Sets the RSA modulus size used by `generate_keys`.
    pub fn with_modulus_bits(mut self, bits: usize) -> Self {
        self.modulus_bits = bits;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn modulus_bits(&self) -> usize {
        self.modulus_bits
    }

    /// Generates and persists a wrapped AES key of `key_size`.
    ///
    /// The AES key is wrapped under the stored key pair, so keys of other
    /// sizes already in the store stay usable. A fresh pair is generated and
    /// persisted only when the store holds none; if that persistence fails,
    /// no AES key is generated, wrapped, or written. A stored public key that
    /// does not belong to the stored private key is a `KeyFormat` error.
    pub fn generate_keys(&self, key_size: KeySize) -> CryptoResult<KeyBundle> {
        let key_pair = match self.stored_key_pair()? {
            Some(key_pair) => {
                info!(
                    "reusing stored {}-bit RSA key pair for {key_size} key",
                    key_pair.modulus_bits()
                );
                key_pair
            }
            None => {
                info!(
                    "generating {}-bit RSA key pair and {key_size} key",
                    self.modulus_bits
                );
                let key_pair = asymmetric::generate_key_pair(self.modulus_bits)?;
                if let Err(e) = self.persist_key_pair(&key_pair) {
                    warn!("key pair persistence failed, symmetric key not generated: {e}");
                    return Err(e);
                }
                key_pair
            }
        };

        let symmetric_key = symmetric::generate_key(key_size);
        let wrapped_key = wrap::wrap_key(&key_pair.public, &symmetric_key)?;
        drop(symmetric_key);

        self.store.save_wrapped_key(key_size, &wrapped_key)?;
        let key_pair_id = key_pair.fingerprint()?;
        info!("key bundle {key_pair_id} generated");

        Ok(KeyBundle {
            key_pair,
            wrapped_key,
            key_size,
            key_pair_id,
            created_at: Utc::now(),
        })
    }

    /// Replaces the stored key pair and re-wraps every stored AES key under it.
    ///
    /// All wrapped keys are re-wrapped in memory before anything is written,
    /// so a key that fails to unwrap leaves the store untouched.
    pub fn rotate_key_pair(&self) -> CryptoResult<KeyRotation> {
        let old_pair = self.stored_key_pair()?.ok_or_else(|| {
            CryptoError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no key pair in key store to rotate",
            ))
        })?;

        let mut stored = Vec::new();
        for size in KeySize::ALL {
            match self.store.load_wrapped_key(size) {
                Ok(wrapped) => stored.push((size, wrapped)),
                Err(CryptoError::Io(_)) => {}
                Err(e) => return Err(e),
            }
        }

        info!(
            "rotating to a fresh {}-bit RSA key pair, {} wrapped key(s) to carry over",
            self.modulus_bits,
            stored.len()
        );
        let new_pair = asymmetric::generate_key_pair(self.modulus_bits)?;
        let rewrapped = stored
            .iter()
            .map(|(size, wrapped)| {
                wrap::rewrap(&old_pair.private, &new_pair.public, wrapped).map(|w| (*size, w))
            })
            .collect::<CryptoResult<Vec<_>>>()?;

        self.persist_key_pair(&new_pair)?;
        for (size, wrapped) in &rewrapped {
            self.store.save_wrapped_key(*size, wrapped)?;
            debug!("re-wrapped {size} key");
        }

        let rotation = KeyRotation {
            previous_key_pair_id: old_pair.fingerprint()?,
            key_pair_id: new_pair.fingerprint()?,
            rewrapped_key_bits: rewrapped.iter().map(|(size, _)| size.bits()).collect(),
        };
        info!(
            "key pair {} replaced by {}",
            rotation.previous_key_pair_id, rotation.key_pair_id
        );
        Ok(rotation)
    }

    /// Encrypts a document under the stored AES key of `key_size`.
    pub fn encrypt_document(
        &self,
        plaintext: &[u8],
        key_size: KeySize,
    ) -> CryptoResult<EncryptedPayload> {
        let result = self
            .unwrap_stored_key(key_size)
            .and_then(|key| symmetric::encrypt(&key, plaintext));

        match result {
            Ok(payload) => {
                debug!(
                    "encrypted {} byte document into {} byte payload",
                    plaintext.len(),
                    payload.len()
                );
                Ok(payload)
            }
            Err(e) => {
                warn!("document encryption failed: {e}");
                Err(CryptoError::DocumentEncrypt(Box::new(e)))
            }
        }
    }

    /// Decrypts a payload with the stored AES key of `key_size`.
    pub fn decrypt_document(
        &self,
        payload: &EncryptedPayload,
        key_size: KeySize,
    ) -> CryptoResult<Vec<u8>> {
        let result = self
            .unwrap_stored_key(key_size)
            .and_then(|key| symmetric::decrypt(&key, payload));

        match result {
            Ok(plaintext) => {
                debug!("decrypted {} byte document", plaintext.len());
                Ok(plaintext)
            }
            Err(e) => {
                warn!("document decryption failed: {e}");
                Err(CryptoError::DocumentDecrypt(Box::new(e)))
            }
        }
    }

    /// Parses raw ciphertext bytes, then decrypts them.
    pub fn decrypt_document_bytes(&self, blob: &[u8], key_size: KeySize) -> CryptoResult<Vec<u8>> {
        let payload = EncryptedPayload::from_bytes(blob)
            .map_err(|e| CryptoError::DocumentDecrypt(Box::new(e)))?;
        self.decrypt_document(&payload, key_size)
    }

    /// Rebuilds the bundle for `key_size` from the store.
    ///
    /// The stored public key must belong to the stored private key.
    pub fn load_bundle(&self, key_size: KeySize) -> CryptoResult<KeyBundle> {
        let key_pair = KeyPair::from_private(self.store.load_private_key()?);
        let stored_public = self.store.load_public_key()?;
        ensure_matching(&key_pair, &stored_public)?;
        let wrapped_key = self.store.load_wrapped_key(key_size)?;
        let key_pair_id = key_pair.fingerprint()?;

        Ok(KeyBundle {
            key_pair,
            wrapped_key,
            key_size,
            key_pair_id,
            created_at: Utc::now(),
        })
    }

    /// The stored pair, or `None` when either half cannot be read.
    fn stored_key_pair(&self) -> CryptoResult<Option<KeyPair>> {
        let private = match self.store.load_private_key() {
            Ok(key) => key,
            Err(CryptoError::Io(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let public = match self.store.load_public_key() {
            Ok(key) => key,
            Err(CryptoError::Io(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let key_pair = KeyPair::from_private(private);
        ensure_matching(&key_pair, &public)?;
        Ok(Some(key_pair))
    }

    fn persist_key_pair(&self, key_pair: &KeyPair) -> CryptoResult<()> {
        self.store.save_private_key(&key_pair.private)?;
        self.store.save_public_key(&key_pair.public)
    }

    fn unwrap_stored_key(&self, key_size: KeySize) -> CryptoResult<SymmetricKey> {
        let private_key = self.store.load_private_key()?;
        let wrapped = self.store.load_wrapped_key(key_size)?;
        let key = wrap::unwrap_key(&private_key, &wrapped, key_size)?;
        debug!("unwrapped {key_size} key");
        Ok(key)
    }
}

fn ensure_matching(key_pair: &KeyPair, stored_public: &rsa::RsaPublicKey) -> CryptoResult<()> {
    if *stored_public != key_pair.public {
        return Err(CryptoError::KeyFormat(
            "stored public key does not match the stored private key".to_string(),
        ));
    }
    Ok(())
}
