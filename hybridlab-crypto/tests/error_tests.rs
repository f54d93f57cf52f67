use hybridlab_crypto::CryptoError;

#[test]
fn unwrap_error_display_has_no_cause() {
    assert_eq!(CryptoError::Unwrap.to_string(), "key unwrap failed");
}

#[test]
fn padding_error_display_has_no_cause() {
    assert_eq!(
        CryptoError::Padding.to_string(),
        "decryption failed (wrong key or corrupted data)"
    );
}

#[test]
fn format_error_display() {
    let err = CryptoError::Format("too short".into());
    assert_eq!(err.to_string(), "malformed ciphertext: too short");
}

#[test]
fn key_generation_error_display() {
    let err = CryptoError::KeyGeneration("modulus too small".into());
    assert_eq!(err.to_string(), "key generation failed: modulus too small");
}

#[test]
fn invalid_key_size_display() {
    let err = CryptoError::InvalidKeySize(64);
    assert_eq!(
        err.to_string(),
        "unsupported symmetric key size: 64 bits (expected 128, 192 or 256)"
    );
}

#[test]
fn io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: CryptoError = io.into();
    assert_eq!(err.kind(), "io");
    assert_eq!(err.to_string(), "I/O error: gone");
}

#[test]
fn document_errors_expose_root_cause() {
    let err = CryptoError::DocumentDecrypt(Box::new(CryptoError::Padding));
    assert_eq!(err.kind(), "document-decrypt");
    assert_eq!(err.root_cause().kind(), "padding");
    assert_eq!(
        err.to_string(),
        "document decryption failed: decryption failed (wrong key or corrupted data)"
    );
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn document_encrypt_wraps_cause() {
    let err = CryptoError::DocumentEncrypt(Box::new(CryptoError::Unwrap));
    assert_eq!(err.to_string(), "document encryption failed: key unwrap failed");
    assert!(matches!(err.root_cause(), CryptoError::Unwrap));
}
