//! Symmetric key wrapping under RSA-OAEP.
//!
//! OAEP uses SHA-256 both as the label hash and inside MGF1, with an empty
//! label. A wrapped key is exactly one modulus long and can only be opened
//! by the private half of the pair whose public key produced it.
//!
//! Unwrap failures are reported as a single `CryptoError::Unwrap` value,
//! whatever went wrong.

use crate::error::{CryptoError, CryptoResult};
use crate::symmetric::{KeySize, SymmetricKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

/// SHA-256 output length, used for the OAEP capacity bound.
const HASH_LEN: usize = 32;

/// Symmetric key encrypted under an RSA public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappedKey {
    bytes: Vec<u8>,
}

impl WrappedKey {
    /// Takes wrapped bytes as read from storage. They are only checked when
    /// unwrapped.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
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

/// Largest message OAEP-SHA256 can carry under the given public key.
pub fn max_wrap_len(public_key: &RsaPublicKey) -> usize {
    public_key.size().saturating_sub(2 * HASH_LEN + 2)
}

/// Wraps raw key bytes under `public_key`.
pub fn wrap(public_key: &RsaPublicKey, key: &[u8]) -> CryptoResult<WrappedKey> {
    let capacity = max_wrap_len(public_key);
    if key.len() > capacity {
        return Err(CryptoError::Wrap(format!(
            "{} byte key exceeds the {capacity}-byte OAEP capacity of this modulus",
            key.len()
        )));
    }

    let mut rng = rsa::rand_core::OsRng;
    let bytes = public_key
        .encrypt(&mut rng, Oaep::new::<Sha256>(), key)
        .map_err(|e| CryptoError::Wrap(e.to_string()))?;
    Ok(WrappedKey { bytes })
}

/// Wraps a symmetric key under `public_key`.
pub fn wrap_key(public_key: &RsaPublicKey, key: &SymmetricKey) -> CryptoResult<WrappedKey> {
    wrap(public_key, key.as_bytes())
}

/// Unwraps raw key bytes with `private_key`.
pub fn unwrap(private_key: &RsaPrivateKey, wrapped: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
    if wrapped.len() != private_key.size() {
        return Err(CryptoError::Unwrap);
    }
    private_key
        .decrypt(Oaep::new::<Sha256>(), wrapped)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::Unwrap)
}

/// Unwraps a key and checks it has the expected size.
pub fn unwrap_key(
    private_key: &RsaPrivateKey,
    wrapped: &WrappedKey,
    expected: KeySize,
) -> CryptoResult<SymmetricKey> {
    let raw = unwrap(private_key, wrapped.as_bytes())?;
    if raw.len() != expected.bytes() {
        return Err(CryptoError::Unwrap);
    }
    SymmetricKey::from_bytes(&raw).map_err(|_| CryptoError::Unwrap)
}

/// Re-wraps a key for another key pair without handing it to the caller.
pub fn rewrap(
    old_private: &RsaPrivateKey,
    new_public: &RsaPublicKey,
    wrapped: &WrappedKey,
) -> CryptoResult<WrappedKey> {
    let raw = unwrap(old_private, wrapped.as_bytes())?;
    wrap(new_public, &raw)
}
