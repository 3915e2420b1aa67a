//! Password-based key derivation using PBKDF2-HMAC-SHA512.
//!
//! Every vault item carries its own random 64-byte salt.  The item key
//! is derived from the process-wide master secret and that salt, so the
//! same secret + salt always produce the same key across restarts.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

/// Length of the per-item salt in bytes (512 bits).
pub const SALT_LEN: usize = 64;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 210_000;

/// Minimum accepted iteration count.
pub const MIN_ITERATIONS: u32 = 1_000;

/// Minimum iteration count for new items in production.
pub const PRODUCTION_MIN_ITERATIONS: u32 = 100_000;

/// Tunable PBKDF2 parameters.
///
/// Maps 1:1 to `kdf_iterations` in `Settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Derive a 32-byte item key from the master secret and a salt.
///
/// Enforces the minimum iteration count so a misconfigured deployment
/// cannot silently weaken every stored item.
pub fn derive_key(
    master_secret: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if params.iterations < MIN_ITERATIONS {
        return Err(VaultError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {})",
            params.iterations
        )));
    }
    if master_secret.is_empty() {
        return Err(VaultError::KeyDerivationFailed(
            "master secret cannot be empty".into(),
        ));
    }
    if salt.len() != SALT_LEN {
        return Err(VaultError::KeyDerivationFailed(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha512>(master_secret, salt, params.iterations, &mut key[..]);
    Ok(key)
}

/// Generate a cryptographically random 64-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: KdfParams = KdfParams {
        iterations: MIN_ITERATIONS,
    };

    #[test]
    fn same_inputs_same_key() {
        let salt = [9u8; SALT_LEN];
        let a = derive_key(b"master", &salt, &FAST).unwrap();
        let b = derive_key(b"master", &salt, &FAST).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn different_salt_different_key() {
        let a = derive_key(b"master", &[1u8; SALT_LEN], &FAST).unwrap();
        let b = derive_key(b"master", &[2u8; SALT_LEN], &FAST).unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn rejects_weak_iterations() {
        let weak = KdfParams { iterations: 10 };
        assert!(derive_key(b"master", &[0u8; SALT_LEN], &weak).is_err());
    }

    #[test]
    fn rejects_wrong_salt_length() {
        assert!(derive_key(b"master", &[0u8; 16], &FAST).is_err());
    }

    #[test]
    fn rejects_empty_master_secret() {
        assert!(derive_key(b"", &[0u8; SALT_LEN], &FAST).is_err());
    }

    #[test]
    fn generated_salts_differ() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
