//! AES-256-GCM authenticated encryption with a 16-byte IV.
//!
//! Each call to `encrypt` generates a fresh random IV.  Unlike a sealed
//! blob, the IV and the 16-byte authentication tag are returned as
//! separate fields so the item store can persist them in their own
//! columns:
//!
//!   ciphertext | iv (16 bytes) | tag (16 bytes)

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};

use crate::errors::{Result, VaultError};

/// AES-256-GCM parameterised with a 128-bit nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Size of the initialization vector in bytes.
pub const IV_LEN: usize = 16;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Size of the AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Output of a single encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
}

/// Encrypt `plaintext` with a 32-byte `key`.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<EncryptedPayload> {
    if key.len() != KEY_LEN {
        return Err(VaultError::EncryptionFailed(format!(
            "key must be {KEY_LEN} bytes, got {}",
            key.len()
        )));
    }

    let cipher = Aes256Gcm16::new_from_slice(key)
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm16::generate_nonce(&mut OsRng);

    // Encrypt in place and keep the tag detached.
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(&nonce, b"", &mut buffer)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&nonce);
    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok(EncryptedPayload {
        ciphertext: buffer,
        iv,
        tag: tag_bytes,
    })
}

/// Decrypt a payload produced by `encrypt`.
///
/// Any malformed input (wrong key, IV or tag length) and any tag
/// mismatch surface as `DecryptionFailed`.
pub fn decrypt(key: &[u8], ciphertext: &[u8], iv: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
    if key.len() != KEY_LEN || iv.len() != IV_LEN || tag.len() != TAG_LEN {
        return Err(VaultError::DecryptionFailed);
    }

    let cipher = Aes256Gcm16::new_from_slice(key).map_err(|_| VaultError::DecryptionFailed)?;
    let nonce = Nonce::<U16>::from_slice(iv);
    let tag = Tag::<U16>::from_slice(tag);

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(nonce, b"", &mut buffer, tag)
        .map_err(|_| VaultError::DecryptionFailed)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_fields_have_fixed_lengths() {
        let payload = encrypt(&[7u8; KEY_LEN], b"hello").unwrap();
        assert_eq!(payload.iv.len(), IV_LEN);
        assert_eq!(payload.tag.len(), TAG_LEN);
        // GCM is a stream mode: no padding.
        assert_eq!(payload.ciphertext.len(), 5);
    }

    #[test]
    fn encrypt_rejects_short_key() {
        assert!(encrypt(&[0u8; 16], b"x").is_err());
    }

    #[test]
    fn decrypt_rejects_bad_lengths() {
        let key = [1u8; KEY_LEN];
        let payload = encrypt(&key, b"value").unwrap();

        assert!(decrypt(&key, &payload.ciphertext, &payload.iv[..12], &payload.tag).is_err());
        assert!(decrypt(&key, &payload.ciphertext, &payload.iv, &payload.tag[..8]).is_err());
        assert!(decrypt(&key[..31], &payload.ciphertext, &payload.iv, &payload.tag).is_err());
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = [2u8; KEY_LEN];
        let payload = encrypt(&key, b"").unwrap();
        let out = decrypt(&key, &payload.ciphertext, &payload.iv, &payload.tag).unwrap();
        assert!(out.is_empty());
    }
}
