//! Master secret handling and per-item sealing.
//!
//! The master secret never touches the database.  For every item we:
//! - generate a fresh 64-byte salt,
//! - derive the item key with PBKDF2 from master secret + salt,
//! - encrypt with AES-256-GCM under a fresh 16-byte IV.
//!
//! The resulting ciphertext, IV, tag and salt are hex-encoded into a
//! `SealedContent` and always stored together.  The key is always
//! re-derived from the persisted salt, never from the IV.

use zeroize::{Zeroize, Zeroizing};

use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::kdf::{derive_key, generate_salt, KdfParams, SALT_LEN};
use crate::errors::{Result, VaultError};

/// The process-wide master secret.  Zeroed on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterSecret {
    bytes: Vec<u8>,
}

impl MasterSecret {
    /// Wrap raw secret bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Access the raw bytes (e.g. to feed PBKDF2).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterSecret(..)")
    }
}

/// The encrypted columns of a vault item: hex ciphertext, IV, tag and
/// salt, plus the PBKDF2 iteration count the key was derived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedContent {
    pub ciphertext: String,
    pub iv: String,
    pub tag: String,
    pub salt: String,
    pub iterations: u32,
}

/// Encrypt `plaintext` for storage under a fresh salt and IV.
pub fn seal(master: &MasterSecret, params: &KdfParams, plaintext: &str) -> Result<SealedContent> {
    let salt = generate_salt();
    let key = derive_key(master.as_bytes(), &salt, params)?;
    let payload = encrypt(&key[..], plaintext.as_bytes())?;

    Ok(SealedContent {
        ciphertext: hex::encode(&payload.ciphertext),
        iv: hex::encode(payload.iv),
        tag: hex::encode(payload.tag),
        salt: hex::encode(salt),
        iterations: params.iterations,
    })
}

/// Decrypt a `SealedContent` back to plaintext.
///
/// The key is re-derived with the iteration count stored alongside the
/// salt, not the one currently configured.  Malformed hex or a salt of
/// the wrong size is treated the same as a failed tag check: the stored
/// row cannot be trusted.
pub fn open(master: &MasterSecret, sealed: &SealedContent) -> Result<Zeroizing<String>> {
    let ciphertext = hex::decode(&sealed.ciphertext).map_err(|_| VaultError::DecryptionFailed)?;
    let iv = hex::decode(&sealed.iv).map_err(|_| VaultError::DecryptionFailed)?;
    let tag = hex::decode(&sealed.tag).map_err(|_| VaultError::DecryptionFailed)?;
    let salt = hex::decode(&sealed.salt).map_err(|_| VaultError::DecryptionFailed)?;

    if salt.len() != SALT_LEN {
        return Err(VaultError::DecryptionFailed);
    }

    let params = KdfParams {
        iterations: sealed.iterations,
    };
    let key = derive_key(master.as_bytes(), &salt, &params)?;
    let plaintext = decrypt(&key[..], &ciphertext, &iv, &tag)?;

    // from_utf8 takes ownership; scrub the bytes if they are not text.
    String::from_utf8(plaintext).map(Zeroizing::new).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        VaultError::DecryptionFailed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::MIN_ITERATIONS;

    const FAST: KdfParams = KdfParams {
        iterations: MIN_ITERATIONS,
    };

    #[test]
    fn seal_then_open() {
        let master = MasterSecret::new("master-secret");
        let sealed = seal(&master, &FAST, "s3cr3t").unwrap();
        assert_eq!(open(&master, &sealed).unwrap().as_str(), "s3cr3t");
    }

    #[test]
    fn sealed_fields_are_hex_with_expected_sizes() {
        let master = MasterSecret::new("master-secret");
        let sealed = seal(&master, &FAST, "abc").unwrap();
        assert_eq!(sealed.iv.len(), 32);
        assert_eq!(sealed.tag.len(), 32);
        assert_eq!(sealed.salt.len(), 128);
        assert_eq!(sealed.ciphertext.len(), 6);
    }

    #[test]
    fn salt_and_iv_are_independent() {
        let master = MasterSecret::new("master-secret");
        let sealed = seal(&master, &FAST, "abc").unwrap();
        assert!(!sealed.salt.starts_with(&sealed.iv));
    }

    #[test]
    fn open_with_other_master_fails() {
        let sealed = seal(&MasterSecret::new("one"), &FAST, "abc").unwrap();
        let result = open(&MasterSecret::new("two"), &sealed);
        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn open_rejects_malformed_hex() {
        let master = MasterSecret::new("m");
        let mut sealed = seal(&master, &FAST, "abc").unwrap();
        sealed.iv = "zz".into();
        assert!(matches!(
            open(&master, &sealed),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn open_rejects_truncated_salt() {
        let master = MasterSecret::new("m");
        let mut sealed = seal(&master, &FAST, "abc").unwrap();
        sealed.salt.truncate(64);
        assert!(matches!(
            open(&master, &sealed),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn open_uses_the_recorded_iteration_count() {
        let master = MasterSecret::new("m");
        let slow = KdfParams {
            iterations: MIN_ITERATIONS * 2,
        };
        let sealed = seal(&master, &slow, "abc").unwrap();
        assert_eq!(sealed.iterations, MIN_ITERATIONS * 2);
        assert_eq!(open(&master, &sealed).unwrap().as_str(), "abc");
    }

    #[test]
    fn open_with_wrong_iteration_count_fails() {
        let master = MasterSecret::new("m");
        let mut sealed = seal(&master, &FAST, "abc").unwrap();
        sealed.iterations += 1;
        assert!(matches!(
            open(&master, &sealed),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn debug_does_not_print_secret() {
        let master = MasterSecret::new("hunter2");
        assert!(!format!("{master:?}").contains("hunter2"));
    }
}
