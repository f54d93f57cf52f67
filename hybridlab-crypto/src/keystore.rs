//! Persistence of key artifacts.
//!
//! [`KeyStore`] is the seam between the hybrid workflows and wherever keys
//! live. [`FileKeyStore`] keeps flat files at explicit paths; the wrapped key
//! for each symmetric key size gets its own file so several sizes can sit
//! next to one key pair. [`MemoryKeyStore`] keeps everything in process.

use crate::asymmetric::{self, private_key_from_pem, private_key_to_pem};
use crate::error::{CryptoError, CryptoResult};
use crate::symmetric::KeySize;
use crate::wrap::WrappedKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use zeroize::Zeroizing;

/// Storage for the three artifacts of a key bundle.
pub trait KeyStore {
    fn save_private_key(&self, key: &RsaPrivateKey) -> CryptoResult<()>;

    fn save_public_key(&self, key: &RsaPublicKey) -> CryptoResult<()>;

    fn save_wrapped_key(&self, size: KeySize, wrapped: &WrappedKey) -> CryptoResult<()>;

    fn load_private_key(&self) -> CryptoResult<RsaPrivateKey>;

    fn load_public_key(&self) -> CryptoResult<RsaPublicKey>;

    fn load_wrapped_key(&self, size: KeySize) -> CryptoResult<WrappedKey>;
}

/// Writes `data` to a temporary sibling of `path`, then renames it into place.
///
/// A failure at any step leaves `path` untouched and removes the temporary.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    write_atomic_with_mode(path, data, None)
}

/// [`write_atomic`] for secrets: on unix the file is created with mode 0600.
pub fn write_atomic_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    write_atomic_with_mode(path, data, Some(0o600))
}

fn write_atomic_with_mode(path: &Path, data: &[u8], mode: Option<u32>) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(format!(".tmp-{}", std::process::id()));
    let tmp_path = dir.join(tmp_name);

    let result = (|| {
        // A stale temporary would keep its old permissions.
        let _ = fs::remove_file(&tmp_path);
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        apply_mode(&mut options, mode);

        let mut file = options.open(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

#[cfg(unix)]
fn apply_mode(options: &mut fs::OpenOptions, mode: Option<u32>) {
    use std::os::unix::fs::OpenOptionsExt;
    if let Some(mode) = mode {
        options.mode(mode);
    }
}

#[cfg(not(unix))]
fn apply_mode(_options: &mut fs::OpenOptions, _mode: Option<u32>) {}

/// Flat-file key store with explicit paths.
#[derive(Clone, Debug)]
pub struct FileKeyStore {
    private_key_path: PathBuf,
    public_key_path: PathBuf,
    wrapped_key_base: PathBuf,
}

impl FileKeyStore {
    /// `wrapped_key_base` names the wrapped key file before the key size is
    /// inserted, e.g. `keys/symmetric.bin` becomes `keys/symmetric_256.bin`.
    pub fn new(
        private_key_path: impl Into<PathBuf>,
        public_key_path: impl Into<PathBuf>,
        wrapped_key_base: impl Into<PathBuf>,
    ) -> Self {
        Self {
            private_key_path: private_key_path.into(),
            public_key_path: public_key_path.into(),
            wrapped_key_base: wrapped_key_base.into(),
        }
    }

    pub fn private_key_path(&self) -> &Path {
        &self.private_key_path
    }

    pub fn public_key_path(&self) -> &Path {
        &self.public_key_path
    }

    /// `<stem>_<bits>.<ext>` next to the configured base path.
    pub fn wrapped_key_path(&self, size: KeySize) -> PathBuf {
        let base = &self.wrapped_key_base;
        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "symmetric".to_string());
        let name = match base.extension() {
            Some(ext) => format!("{stem}_{}.{}", size.bits(), ext.to_string_lossy()),
            None => format!("{stem}_{}", size.bits()),
        };
        base.with_file_name(name)
    }
}

impl KeyStore for FileKeyStore {
    fn save_private_key(&self, key: &RsaPrivateKey) -> CryptoResult<()> {
        asymmetric::serialize_private(key, &self.private_key_path)?;
        debug!("private key written to {}", self.private_key_path.display());
        Ok(())
    }

    fn save_public_key(&self, key: &RsaPublicKey) -> CryptoResult<()> {
        asymmetric::serialize_public(key, &self.public_key_path)?;
        debug!("public key written to {}", self.public_key_path.display());
        Ok(())
    }

    fn save_wrapped_key(&self, size: KeySize, wrapped: &WrappedKey) -> CryptoResult<()> {
        let path = self.wrapped_key_path(size);
        write_atomic(&path, wrapped.as_bytes()).map_err(|e| {
            CryptoError::Serialization(format!("writing wrapped key to {}: {e}", path.display()))
        })?;
        debug!("wrapped {size} key written to {}", path.display());
        Ok(())
    }

    fn load_private_key(&self) -> CryptoResult<RsaPrivateKey> {
        asymmetric::deserialize_private(&self.private_key_path)
    }

    fn load_public_key(&self) -> CryptoResult<RsaPublicKey> {
        asymmetric::deserialize_public(&self.public_key_path)
    }

    fn load_wrapped_key(&self, size: KeySize) -> CryptoResult<WrappedKey> {
        let bytes = fs::read(self.wrapped_key_path(size))?;
        Ok(WrappedKey::from_bytes(bytes))
    }
}

#[derive(Default)]
struct MemoryState {
    private_pem: Option<Zeroizing<String>>,
    public: Option<RsaPublicKey>,
    wrapped: HashMap<KeySize, WrappedKey>,
}

/// In-process key store. The private key is held as PEM, as it would be on disk.
#[derive(Default)]
pub struct MemoryKeyStore {
    state: Mutex<MemoryState>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a wrapped key of the given size has been saved.
    pub fn has_wrapped_key(&self, size: KeySize) -> bool {
        self.state().wrapped.contains_key(&size)
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn missing(what: &str) -> CryptoError {
    CryptoError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("no {what} in key store"),
    ))
}

impl KeyStore for MemoryKeyStore {
    fn save_private_key(&self, key: &RsaPrivateKey) -> CryptoResult<()> {
        let pem = private_key_to_pem(key)?;
        self.state().private_pem = Some(pem);
        Ok(())
    }

    fn save_public_key(&self, key: &RsaPublicKey) -> CryptoResult<()> {
        self.state().public = Some(key.clone());
        Ok(())
    }

    fn save_wrapped_key(&self, size: KeySize, wrapped: &WrappedKey) -> CryptoResult<()> {
        self.state().wrapped.insert(size, wrapped.clone());
        Ok(())
    }

    fn load_private_key(&self) -> CryptoResult<RsaPrivateKey> {
        let state = self.state();
        let pem = state.private_pem.as_ref().ok_or_else(|| missing("private key"))?;
        private_key_from_pem(pem)
    }

    fn load_public_key(&self) -> CryptoResult<RsaPublicKey> {
        self.state()
            .public
            .clone()
            .ok_or_else(|| missing("public key"))
    }

    fn load_wrapped_key(&self, size: KeySize) -> CryptoResult<WrappedKey> {
        self.state()
            .wrapped
            .get(&size)
            .cloned()
            .ok_or_else(|| missing(&format!("wrapped {size} key")))
    }
}
