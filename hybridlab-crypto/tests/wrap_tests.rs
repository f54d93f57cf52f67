use hybridlab_crypto::wrap::max_wrap_len;
use hybridlab_crypto::{
    CryptoError, KeySize, WrappedKey, generate_key, rewrap, unwrap, unwrap_key, wrap, wrap_key,
};

mod support;
use support::{other_pair, primary_pair};

#[test]
fn wrap_unwrap_roundtrip_all_key_sizes() {
    let pair = primary_pair();
    for size in KeySize::ALL {
        let key = generate_key(size);
        let wrapped = wrap_key(&pair.public, &key).unwrap();
        let recovered = unwrap_key(&pair.private, &wrapped, size).unwrap();
        assert_eq!(recovered.as_bytes(), key.as_bytes());
    }
}

#[test]
fn wrapped_key_is_one_modulus_long() {
    let pair = primary_pair();
    let wrapped = wrap_key(&pair.public, &generate_key(KeySize::Aes256)).unwrap();
    assert_eq!(wrapped.len(), 256);
}

#[test]
fn each_wrap_produces_different_ciphertext() {
    let pair = primary_pair();
    let key = generate_key(KeySize::Aes256);

    let w1 = wrap_key(&pair.public, &key).unwrap();
    let w2 = wrap_key(&pair.public, &key).unwrap();

    // OAEP is randomized
    assert_ne!(w1, w2);
    assert_eq!(*unwrap(&pair.private, w1.as_bytes()).unwrap(), key.as_bytes());
    assert_eq!(*unwrap(&pair.private, w2.as_bytes()).unwrap(), key.as_bytes());
}

#[test]
fn wrong_private_key_fails_to_unwrap() {
    let key = generate_key(KeySize::Aes256);
    let wrapped = wrap_key(&primary_pair().public, &key).unwrap();

    let result = unwrap(&other_pair().private, wrapped.as_bytes());
    assert!(matches!(result, Err(CryptoError::Unwrap)));
}

#[test]
fn tampered_wrapped_key_fails() {
    let pair = primary_pair();
    let wrapped = wrap_key(&pair.public, &generate_key(KeySize::Aes128)).unwrap();

    let mut bytes = wrapped.as_bytes().to_vec();
    bytes[100] ^= 0xFF;
    assert!(matches!(
        unwrap(&pair.private, &bytes),
        Err(CryptoError::Unwrap)
    ));
}

#[test]
fn truncated_wrapped_key_fails_identically() {
    let pair = primary_pair();
    let wrapped = wrap_key(&pair.public, &generate_key(KeySize::Aes128)).unwrap();

    let truncated = unwrap(&pair.private, &wrapped.as_bytes()[..255]).unwrap_err();
    let wrong_key = unwrap(&other_pair().private, wrapped.as_bytes()).unwrap_err();
    assert_eq!(truncated.to_string(), wrong_key.to_string());
}

#[test]
fn unwrap_with_wrong_expected_size_fails() {
    let pair = primary_pair();
    let wrapped = wrap_key(&pair.public, &generate_key(KeySize::Aes128)).unwrap();
    assert!(matches!(
        unwrap_key(&pair.private, &wrapped, KeySize::Aes256),
        Err(CryptoError::Unwrap)
    ));
}

#[test]
fn oversized_key_rejected_by_wrap() {
    let pair = primary_pair();
    let capacity = max_wrap_len(&pair.public);
    assert_eq!(capacity, 256 - 2 * 32 - 2);

    assert!(wrap(&pair.public, &vec![0xAB; capacity]).is_ok());
    assert!(matches!(
        wrap(&pair.public, &vec![0xAB; capacity + 1]),
        Err(CryptoError::Wrap(_))
    ));
}

#[test]
fn rewrap_moves_key_to_new_pair() {
    let key = generate_key(KeySize::Aes256);
    let wrapped = wrap_key(&primary_pair().public, &key).unwrap();

    let moved = rewrap(&primary_pair().private, &other_pair().public, &wrapped).unwrap();
    let recovered = unwrap_key(&other_pair().private, &moved, KeySize::Aes256).unwrap();
    assert_eq!(recovered.as_bytes(), key.as_bytes());

    // The original pair can no longer open the re-wrapped key.
    assert!(unwrap(&primary_pair().private, moved.as_bytes()).is_err());
}

#[test]
fn rewrap_with_wrong_old_key_fails() {
    let wrapped = wrap_key(&primary_pair().public, &generate_key(KeySize::Aes256)).unwrap();
    let result = rewrap(&other_pair().private, &primary_pair().public, &wrapped);
    assert!(matches!(result, Err(CryptoError::Unwrap)));
}

#[test]
fn wrapped_key_from_bytes_preserves_contents() {
    let pair = primary_pair();
    let wrapped = wrap_key(&pair.public, &generate_key(KeySize::Aes192)).unwrap();
    let restored = WrappedKey::from_bytes(wrapped.as_bytes().to_vec());
    assert_eq!(restored, wrapped);
    assert!(unwrap_key(&pair.private, &restored, KeySize::Aes192).is_ok());
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn wrap_unwrap_always_roundtrips(key in proptest::collection::vec(any::<u8>(), 0..=190)) {
            let pair = primary_pair();
            let wrapped = wrap(&pair.public, &key).unwrap();
            let recovered = unwrap(&pair.private, wrapped.as_bytes()).unwrap();
            prop_assert_eq!(&*recovered, &key);
        }
    }
}
