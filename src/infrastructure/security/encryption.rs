//! Secret codec implementation
//!
//! This module provides password-based authenticated encryption for wallet
//! secret keys at rest. A blob is `base64(salt ‖ nonce ‖ tag ‖ ciphertext)`
//! with fixed-width fields, so parsing never depends on content.

use crate::core::domain::security::{MIN_BLOB_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::core::error::AppError;
use crate::utils::crypto::{
    generate_nonce, generate_salt, open_in_place, seal_in_place, KdfParams, SecureKey,
};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{debug, instrument};
use zeroize::Zeroizing;

/// Result type for encryption operations
pub type EncryptionResult<T> = Result<T, EncryptionError>;

/// Encryption-specific errors
#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    /// Integrity tag did not verify
    #[error("Authentication failed: wrong password or tampered data")]
    Authentication,

    /// Blob is not decodable or too short
    #[error("Malformed encrypted blob: {0}")]
    Format(String),

    /// Argon2 rejected its parameters or input
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
}

impl From<EncryptionError> for AppError {
    fn from(err: EncryptionError) -> Self {
        match err {
            EncryptionError::Authentication => AppError::authentication(err.to_string()),
            EncryptionError::Format(_) => AppError::format(err.to_string()),
            EncryptionError::KeyDerivation(_) | EncryptionError::EncryptionFailed(_) => {
                AppError::internal(err.to_string())
            }
        }
    }
}

/// Password-keyed codec for secret byte buffers
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretCodec {
    params: KdfParams,
}

impl SecretCodec {
    /// Create a codec with the given Argon2id cost
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    /// Encrypt `secret` under `password`
    ///
    /// Salt and nonce are drawn fresh on every call.
    #[instrument(skip_all, fields(len = secret.len()))]
    pub fn encrypt(&self, secret: &[u8], password: &str) -> EncryptionResult<String> {
        let salt = generate_salt();
        let nonce = generate_nonce();
        let key = SecureKey::derive(password.as_bytes(), &salt, self.params)
            .map_err(|e| EncryptionError::KeyDerivation(e.to_string()))?;

        let mut blob = Vec::with_capacity(MIN_BLOB_SIZE + secret.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&[0u8; TAG_SIZE]);
        blob.extend_from_slice(secret);

        let tag = seal_in_place(&key, &nonce, &mut blob[MIN_BLOB_SIZE..])
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;
        blob[SALT_SIZE + NONCE_SIZE..MIN_BLOB_SIZE].copy_from_slice(&tag);

        debug!("Sealed {} byte secret", secret.len());
        Ok(BASE64.encode(blob))
    }

    /// Decrypt a blob produced by [`SecretCodec::encrypt`]
    ///
    /// The plaintext is returned in a container that wipes itself on drop.
    #[instrument(skip_all)]
    pub fn decrypt(&self, blob: &str, password: &str) -> EncryptionResult<Zeroizing<Vec<u8>>> {
        let raw = BASE64
            .decode(blob.trim())
            .map_err(|e| EncryptionError::Format(format!("invalid base64: {e}")))?;

        if raw.len() < MIN_BLOB_SIZE {
            return Err(EncryptionError::Format(format!(
                "blob is {} bytes, expected at least {MIN_BLOB_SIZE}",
                raw.len()
            )));
        }

        let (salt, rest) = raw.split_at(SALT_SIZE);
        let (nonce, rest) = rest.split_at(NONCE_SIZE);
        let (tag, ciphertext) = rest.split_at(TAG_SIZE);

        let salt: [u8; SALT_SIZE] = salt
            .try_into()
            .map_err(|_| EncryptionError::Format("salt".to_string()))?;
        let nonce: [u8; NONCE_SIZE] = nonce
            .try_into()
            .map_err(|_| EncryptionError::Format("nonce".to_string()))?;
        let tag: [u8; TAG_SIZE] = tag
            .try_into()
            .map_err(|_| EncryptionError::Format("tag".to_string()))?;

        let key = SecureKey::derive(password.as_bytes(), &salt, self.params)
            .map_err(|e| EncryptionError::KeyDerivation(e.to_string()))?;

        let mut plaintext = Zeroizing::new(ciphertext.to_vec());
        open_in_place(&key, &nonce, &tag, plaintext.as_mut_slice())
            .map_err(|_| EncryptionError::Authentication)?;

        Ok(plaintext)
    }
}
