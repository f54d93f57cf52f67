//! PKCS#7 padding for the AES-CBC document cipher.

use crate::error::{CryptoError, CryptoResult};
use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater, ConstantTimeLess};

/// Appends 1..=`block_size` bytes, each equal to the number of bytes added.
///
/// Input that is already block-aligned gains a full block of padding.
pub fn pkcs7_pad(data: &[u8], block_size: usize) -> Vec<u8> {
    debug_assert!((1..=255).contains(&block_size));
    let pad = block_size - (data.len() % block_size);
    let mut out = Vec::with_capacity(data.len() + pad);
    out.extend_from_slice(data);
    out.resize(data.len() + pad, pad as u8);
    out
}

/// Removes PKCS#7 padding.
///
/// The padding check inspects the whole final block regardless of the pad
/// value, and every malformed input produces the same `CryptoError::Padding`.
pub fn pkcs7_unpad(data: &[u8], block_size: usize) -> CryptoResult<Vec<u8>> {
    if data.is_empty() || !data.len().is_multiple_of(block_size) {
        return Err(CryptoError::Padding);
    }

    let last_block = &data[data.len() - block_size..];
    let pad = last_block[block_size - 1];

    let mut valid = !pad.ct_eq(&0) & !pad.ct_gt(&(block_size as u8));
    for (i, byte) in last_block.iter().rev().enumerate() {
        let in_padding: Choice = (i as u8).ct_lt(&pad);
        valid &= !in_padding | byte.ct_eq(&pad);
    }

    if !bool::from(valid) {
        return Err(CryptoError::Padding);
    }

    Ok(data[..data.len() - pad as usize].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_partial_block() {
        let padded = pkcs7_pad(b"hello", 16);
        assert_eq!(padded.len(), 16);
        assert!(padded[5..].iter().all(|&b| b == 11));
    }

    #[test]
    fn aligned_input_gains_full_block() {
        let padded = pkcs7_pad(&[0xAA; 16], 16);
        assert_eq!(padded.len(), 32);
        assert!(padded[16..].iter().all(|&b| b == 16));
    }

    #[test]
    fn empty_input_becomes_one_block() {
        assert_eq!(pkcs7_pad(b"", 16), vec![16u8; 16]);
    }

    #[test]
    fn unpad_restores_original_length() {
        for len in 0..=48 {
            let data = vec![0x42u8; len];
            let padded = pkcs7_pad(&data, 16);
            assert_eq!(pkcs7_unpad(&padded, 16).unwrap(), data);
        }
    }

    #[test]
    fn zero_pad_byte_rejected() {
        let mut block = [7u8; 16];
        block[15] = 0;
        assert!(matches!(pkcs7_unpad(&block, 16), Err(CryptoError::Padding)));
    }

    #[test]
    fn oversized_pad_byte_rejected() {
        let block = [17u8; 16];
        assert!(matches!(pkcs7_unpad(&block, 16), Err(CryptoError::Padding)));
    }

    #[test]
    fn inconsistent_pad_bytes_rejected() {
        let mut padded = pkcs7_pad(b"abc", 16);
        padded[10] ^= 0x01;
        assert!(matches!(pkcs7_unpad(&padded, 16), Err(CryptoError::Padding)));
    }

    #[test]
    fn unaligned_or_empty_input_rejected() {
        assert!(matches!(pkcs7_unpad(&[], 16), Err(CryptoError::Padding)));
        assert!(matches!(pkcs7_unpad(&[1u8; 15], 16), Err(CryptoError::Padding)));
    }
}
