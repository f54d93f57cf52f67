//! CLI settings.

use anyhow::{Context, Result};
use hybridlab_crypto::{FileKeyStore, KeySize};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File locations and key sizes for the hybrid workflows.
///
/// Loaded from a JSON file; unspecified fields fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// PEM private key (PKCS#1).
    pub private_key_path: PathBuf,

    /// PEM public key (SubjectPublicKeyInfo).
    pub public_key_path: PathBuf,

    /// Base name of the wrapped key file; the key size is inserted before
    /// the extension.
    pub wrapped_key_path: PathBuf,

    /// UTF-8 document to encrypt.
    pub plaintext_path: PathBuf,

    /// Ciphertext output of `encrypt`, input of `decrypt`.
    pub encrypted_path: PathBuf,

    /// Plaintext output of `decrypt`.
    pub decrypted_path: PathBuf,

    /// Symmetric key size in bits (128, 192 or 256).
    pub key_bits: usize,

    /// RSA modulus size in bits.
    pub modulus_bits: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            private_key_path: PathBuf::from("keys/private.pem"),
            public_key_path: PathBuf::from("keys/public.pem"),
            wrapped_key_path: PathBuf::from("keys/symmetric.bin"),
            plaintext_path: PathBuf::from("text.txt"),
            encrypted_path: PathBuf::from("encrypted.bin"),
            decrypted_path: PathBuf::from("decrypted.txt"),
            key_bits: 256,
            modulus_bits: 2048,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing settings in {}", path.display()))
    }

    /// Writes settings as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        hybridlab_crypto::write_atomic(path, json.as_bytes())
            .with_context(|| format!("writing settings to {}", path.display()))
    }

    /// Loads `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn key_size(&self) -> Result<KeySize> {
        Ok(KeySize::from_bits(self.key_bits)?)
    }

    pub fn key_store(&self) -> FileKeyStore {
        FileKeyStore::new(
            &self.private_key_path,
            &self.public_key_path,
            &self.wrapped_key_path,
        )
    }
}
