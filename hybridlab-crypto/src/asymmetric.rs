//! RSA key pair lifecycle.
//!
//! Private keys are written as unencrypted PKCS#1 PEM (`RSA PRIVATE KEY`),
//! public keys as SubjectPublicKeyInfo PEM (`PUBLIC KEY`). Loading is more
//! lenient: PKCS#8 private keys and PKCS#1 public keys are accepted as well.

use crate::error::{CryptoError, CryptoResult};
use crate::keystore::{write_atomic, write_atomic_private};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tracing::debug;
use zeroize::Zeroizing;

/// Smallest accepted modulus size.
pub const MIN_MODULUS_BITS: usize = 2048;

/// Modulus size used when none is configured.
pub const DEFAULT_MODULUS_BITS: usize = 2048;

/// Fixed public exponent.
pub const PUBLIC_EXPONENT: u32 = 65537;

/// RSA key pair used to wrap symmetric keys.
///
/// `RsaPrivateKey` zeroizes its secret components on drop.
#[derive(Clone)]
pub struct KeyPair {
    pub private: RsaPrivateKey,
    pub public: RsaPublicKey,
}

impl KeyPair {
    /// Rebuilds a pair from its private half.
    pub fn from_private(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self { private, public }
    }

    /// Modulus size in bits.
    pub fn modulus_bits(&self) -> usize {
        modulus_bits(&self.public)
    }

    /// Hex SHA-256 fingerprint of the public key.
    pub fn fingerprint(&self) -> CryptoResult<String> {
        fingerprint(&self.public)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("modulus_bits", &self.modulus_bits())
            .finish_non_exhaustive()
    }
}

/// Generates an RSA key pair with public exponent 65537.
///
/// Draws from the OS random source and may block for a noticeable time.
pub fn generate_key_pair(bits: usize) -> CryptoResult<KeyPair> {
    if bits < MIN_MODULUS_BITS {
        return Err(CryptoError::KeyGeneration(format!(
            "modulus of {bits} bits is below the {MIN_MODULUS_BITS}-bit minimum"
        )));
    }

    debug!("generating {bits}-bit RSA key pair");
    let mut rng = rsa::rand_core::OsRng;
    let exponent = BigUint::from(PUBLIC_EXPONENT);
    let private = RsaPrivateKey::new_with_exp(&mut rng, bits, &exponent)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    Ok(KeyPair::from_private(private))
}

/// Modulus size of a public key in bits.
pub fn modulus_bits(key: &RsaPublicKey) -> usize {
    key.n().bits()
}

/// Hex SHA-256 over the DER SubjectPublicKeyInfo encoding.
pub fn fingerprint(key: &RsaPublicKey) -> CryptoResult<String> {
    let der = key
        .to_public_key_der()
        .map_err(|e| CryptoError::Serialization(format!("public key DER encoding: {e}")))?;
    Ok(hex::encode(Sha256::digest(der.as_bytes())))
}

/// Encodes a private key as PKCS#1 PEM (`RSA PRIVATE KEY`).
pub fn private_key_to_pem(key: &RsaPrivateKey) -> CryptoResult<Zeroizing<String>> {
    key.to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| CryptoError::Serialization(format!("private key PEM encoding: {e}")))
}

/// Encodes a public key as SubjectPublicKeyInfo PEM (`PUBLIC KEY`).
pub fn public_key_to_pem(key: &RsaPublicKey) -> CryptoResult<String> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::Serialization(format!("public key PEM encoding: {e}")))
}

/// Parses a PKCS#1 or PKCS#8 PEM private key.
pub fn private_key_from_pem(pem: &str) -> CryptoResult<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|_| CryptoError::KeyFormat("not a PEM-encoded RSA private key".to_string()))
}

/// Parses a SubjectPublicKeyInfo or PKCS#1 PEM public key.
pub fn public_key_from_pem(pem: &str) -> CryptoResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|_| CryptoError::KeyFormat("not a PEM-encoded RSA public key".to_string()))
}

/// Writes the private key as PEM, readable by the owner only on unix.
/// Any failure is a `Serialization` error.
pub fn serialize_private(key: &RsaPrivateKey, path: &Path) -> CryptoResult<()> {
    let pem = private_key_to_pem(key)?;
    write_atomic_private(path, pem.as_bytes()).map_err(|e| {
        CryptoError::Serialization(format!("writing private key to {}: {e}", path.display()))
    })
}

/// Writes the public key as PEM. Any failure is a `Serialization` error.
pub fn serialize_public(key: &RsaPublicKey, path: &Path) -> CryptoResult<()> {
    let pem = public_key_to_pem(key)?;
    write_atomic(path, pem.as_bytes()).map_err(|e| {
        CryptoError::Serialization(format!("writing public key to {}: {e}", path.display()))
    })
}

/// Reads a PEM private key file.
///
/// An unreadable file is an `Io` error; content that is not a PEM RSA
/// private key is a `KeyFormat` error.
pub fn deserialize_private(path: &Path) -> CryptoResult<RsaPrivateKey> {
    let pem = Zeroizing::new(read_pem(path)?);
    private_key_from_pem(&pem)
}

/// Reads a PEM public key file, with the same error split as
/// [`deserialize_private`].
pub fn deserialize_public(path: &Path) -> CryptoResult<RsaPublicKey> {
    let pem = read_pem(path)?;
    public_key_from_pem(&pem)
}

fn read_pem(path: &Path) -> CryptoResult<String> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| {
        CryptoError::KeyFormat(format!("{} is not a PEM text file", path.display()))
    })
}
