//! Cryptographic primitives for the community vault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption with detached IV and tag (`encryption`)
//! - PBKDF2-HMAC-SHA512 key derivation from the master secret (`kdf`)
//! - Master secret handling and per-item seal/open (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt, EncryptedPayload};
pub use kdf::{derive_key, generate_salt, KdfParams};
pub use keys::{open, seal, MasterSecret, SealedContent};
