//! Integration tests for the crypto layer.

use commvault::crypto::{decrypt, derive_key, encrypt, generate_salt, open, seal, KdfParams, MasterSecret};
use commvault::errors::VaultError;

const FAST: KdfParams = KdfParams { iterations: 1_000 };

fn test_key() -> Vec<u8> {
    let salt = generate_salt();
    derive_key(b"integration-master", &salt, &FAST).unwrap().to_vec()
}

#[test]
fn derived_key_round_trips_text() {
    let key = test_key();
    let payload = encrypt(&key, b"wifi password: hunter2").unwrap();
    let plain = decrypt(&key, &payload.ciphertext, &payload.iv, &payload.tag).unwrap();
    assert_eq!(plain, b"wifi password: hunter2");
}

#[test]
fn tampered_ciphertext_is_rejected() {
    let key = test_key();
    let payload = encrypt(&key, b"launch codes").unwrap();

    let mut ciphertext = payload.ciphertext.clone();
    ciphertext[0] ^= 0x01;

    let result = decrypt(&key, &ciphertext, &payload.iv, &payload.tag);
    assert!(matches!(result, Err(VaultError::DecryptionFailed)));
}

#[test]
fn tampered_iv_is_rejected() {
    let key = test_key();
    let payload = encrypt(&key, b"launch codes").unwrap();

    let mut iv = payload.iv;
    iv[15] ^= 0x80;

    assert!(decrypt(&key, &payload.ciphertext, &iv, &payload.tag).is_err());
}

#[test]
fn tampered_tag_is_rejected() {
    let key = test_key();
    let payload = encrypt(&key, b"launch codes").unwrap();

    let mut tag = payload.tag;
    tag[7] ^= 0xff;

    assert!(decrypt(&key, &payload.ciphertext, &payload.iv, &tag).is_err());
}

#[test]
fn wrong_key_is_rejected() {
    let payload = encrypt(&test_key(), b"data").unwrap();
    let result = decrypt(&test_key(), &payload.ciphertext, &payload.iv, &payload.tag);
    assert!(matches!(result, Err(VaultError::DecryptionFailed)));
}

#[test]
fn same_plaintext_never_repeats_salt_or_iv() {
    let master = MasterSecret::new("m");
    let a = seal(&master, &FAST, "same").unwrap();
    let b = seal(&master, &FAST, "same").unwrap();

    assert_ne!(a.salt, b.salt);
    assert_ne!(a.iv, b.iv);
    assert_ne!(a.ciphertext, b.ciphertext);
}

#[test]
fn sealed_content_opens_with_same_master() {
    let master = MasterSecret::new("community-master");
    let sealed = seal(&master, &FAST, "übersecret ✓").unwrap();
    assert_eq!(open(&master, &sealed).unwrap().as_str(), "übersecret ✓");
}

#[test]
fn empty_plaintext_round_trips() {
    let key = test_key();
    let payload = encrypt(&key, b"").unwrap();
    assert!(payload.ciphertext.is_empty());
    let plain = decrypt(&key, &payload.ciphertext, &payload.iv, &payload.tag).unwrap();
    assert!(plain.is_empty());
}
