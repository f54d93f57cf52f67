//! Workflow commands backing the CLI subcommands.
//!
//! These own the document files; key files go through the crypto crate's
//! `FileKeyStore`. Outputs are written atomically and only after the whole
//! operation succeeded.

use crate::config::Settings;
use anyhow::{Context, Result};
use hybridlab_crypto::{HybridEncryptionService, KeyBundleInfo, KeyRotation, write_atomic};
use std::fs;
use tracing::info;

/// Generates a wrapped symmetric key, and a key pair if none is stored yet.
pub fn generate(settings: &Settings) -> Result<KeyBundleInfo> {
    let key_size = settings.key_size()?;
    let service =
        HybridEncryptionService::new(settings.key_store()).with_modulus_bits(settings.modulus_bits);

    let bundle = service
        .generate_keys(key_size)
        .context("generating key bundle")?;
    info!(
        "keys written: {}, {}, {}",
        settings.private_key_path.display(),
        settings.public_key_path.display(),
        service.store().wrapped_key_path(key_size).display()
    );
    Ok(bundle.info())
}

/// Replaces the key pair and re-wraps every stored symmetric key.
pub fn rotate(settings: &Settings) -> Result<KeyRotation> {
    let service =
        HybridEncryptionService::new(settings.key_store()).with_modulus_bits(settings.modulus_bits);
    let rotation = service.rotate_key_pair().context("rotating key pair")?;
    info!(
        "key pair rotated, {} wrapped key(s) rewritten",
        rotation.rewrapped_key_bits.len()
    );
    Ok(rotation)
}

/// Encrypts the UTF-8 plaintext file into the ciphertext file.
pub fn encrypt(settings: &Settings) -> Result<usize> {
    let key_size = settings.key_size()?;
    let plaintext = fs::read_to_string(&settings.plaintext_path).with_context(|| {
        format!(
            "reading UTF-8 plaintext from {}",
            settings.plaintext_path.display()
        )
    })?;

    let service = HybridEncryptionService::new(settings.key_store());
    let payload = service.encrypt_document(plaintext.as_bytes(), key_size)?;

    write_atomic(&settings.encrypted_path, payload.as_bytes()).with_context(|| {
        format!(
            "writing ciphertext to {}",
            settings.encrypted_path.display()
        )
    })?;
    info!(
        "encrypted {} into {}",
        settings.plaintext_path.display(),
        settings.encrypted_path.display()
    );
    Ok(payload.len())
}

/// Decrypts the ciphertext file into the decrypted-text file.
pub fn decrypt(settings: &Settings) -> Result<usize> {
    let key_size = settings.key_size()?;
    let blob = fs::read(&settings.encrypted_path).with_context(|| {
        format!(
            "reading ciphertext from {}",
            settings.encrypted_path.display()
        )
    })?;

    let service = HybridEncryptionService::new(settings.key_store());
    let plaintext = service.decrypt_document_bytes(&blob, key_size)?;

    write_atomic(&settings.decrypted_path, &plaintext).with_context(|| {
        format!(
            "writing plaintext to {}",
            settings.decrypted_path.display()
        )
    })?;
    info!(
        "decrypted {} into {}",
        settings.encrypted_path.display(),
        settings.decrypted_path.display()
    );
    Ok(plaintext.len())
}

/// Name of the innermost crypto error kind in an error chain, if any.
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<hybridlab_crypto::CryptoError>())
        .map(|crypto| crypto.root_cause().kind())
        .unwrap_or("error")
}
