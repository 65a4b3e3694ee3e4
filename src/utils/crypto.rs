//! Cryptographic utilities for key derivation and authenticated encryption
//!
//! Thin wrappers over `argon2`, `aes-gcm` and `rand` used by the secret
//! codec. Everything here works on caller-owned buffers so that plaintext
//! never gets copied into allocations the caller cannot wipe.

use crate::core::domain::security::{ENCRYPTION_KEY_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use anyhow::{anyhow, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Cheap parameters for unit tests
    #[cfg(test)]
    pub fn insecure_for_tests() -> Self {
        Self {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Secure key material that zeros itself on drop
pub struct SecureKey {
    key: [u8; ENCRYPTION_KEY_SIZE],
}

impl SecureKey {
    /// Derive a key from a password and salt with Argon2id
    pub fn derive(password: &[u8], salt: &[u8; SALT_SIZE], params: KdfParams) -> Result<Self> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(ENCRYPTION_KEY_SIZE),
        )
        .map_err(|e| anyhow!("Invalid Argon2 parameters: {e}"))?;

        let mut key = [0u8; ENCRYPTION_KEY_SIZE];
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password_into(password, salt, &mut key)
            .map_err(|e| anyhow!("Key derivation failed: {e}"))?;

        Ok(Self { key })
    }

    /// Get the key bytes (use with caution)
    pub fn as_bytes(&self) -> &[u8; ENCRYPTION_KEY_SIZE] {
        &self.key
    }
}

impl Drop for SecureKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for SecureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Generate a cryptographically secure random nonce
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce);
    nonce
}

/// Encrypt `buffer` in place with AES-256-GCM, returning the detached tag
pub fn seal_in_place(
    key: &SecureKey,
    nonce: &[u8; NONCE_SIZE],
    buffer: &mut [u8],
) -> Result<[u8; TAG_SIZE]> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| anyhow!("Failed to create encryption key"))?;

    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", buffer)
        .map_err(|_| anyhow!("Failed to encrypt data"))?;

    let mut out = [0u8; TAG_SIZE];
    out.copy_from_slice(tag.as_slice());
    Ok(out)
}

/// Decrypt `buffer` in place, failing when the tag does not verify
///
/// On failure the buffer still holds ciphertext; no partial plaintext is
/// ever exposed.
pub fn open_in_place(
    key: &SecureKey,
    nonce: &[u8; NONCE_SIZE],
    tag: &[u8; TAG_SIZE],
    buffer: &mut [u8],
) -> Result<()> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| anyhow!("Failed to create decryption key"))?;

    cipher
        .decrypt_in_place_detached(Nonce::from_slice(nonce), b"", buffer, Tag::from_slice(tag))
        .map_err(|_| anyhow!("Failed to decrypt data - invalid key or corrupted data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation_is_deterministic() {
        let salt = generate_salt();
        let params = KdfParams::insecure_for_tests();

        let key1 = SecureKey::derive(b"correct horse", &salt, params).unwrap();
        let key2 = SecureKey::derive(b"correct horse", &salt, params).unwrap();
        let key3 = SecureKey::derive(b"battery staple", &salt, params).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
        assert_ne!(key1.as_bytes(), key3.as_bytes());
    }

    #[test]
    fn test_seal_open() {
        let key = SecureKey::derive(b"password", &generate_salt(), KdfParams::insecure_for_tests()).unwrap();
        let nonce = generate_nonce();
        let mut buffer = b"Sensitive information".to_vec();

        let tag = seal_in_place(&key, &nonce, &mut buffer).unwrap();
        assert_ne!(buffer.as_slice(), b"Sensitive information");

        open_in_place(&key, &nonce, &tag, &mut buffer).unwrap();
        assert_eq!(buffer.as_slice(), b"Sensitive information");
    }

    #[test]
    fn test_open_rejects_wrong_tag() {
        let key = SecureKey::derive(b"password", &generate_salt(), KdfParams::insecure_for_tests()).unwrap();
        let nonce = generate_nonce();
        let mut buffer = vec![7u8; 64];

        let mut tag = seal_in_place(&key, &nonce, &mut buffer).unwrap();
        tag[0] ^= 0x01;

        assert!(open_in_place(&key, &nonce, &tag, &mut buffer).is_err());
    }

    #[test]
    fn test_random_material_differs() {
        assert_ne!(generate_salt(), generate_salt());
        assert_ne!(generate_nonce(), generate_nonce());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = KdfParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        assert!(SecureKey::derive(b"password", &generate_salt(), params).is_err());
    }
}
