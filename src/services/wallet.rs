//! Wallet custody
//!
//! Owns the create/load lifecycle of a user's keypair. Secrets only exist
//! decrypted inside [`WalletCustody::with_keypair`], and the plaintext
//! buffer is wiped on every exit path of that scope.

use chrono::Utc;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::core::error::AppError;
use crate::core::repository::WalletStore;
use crate::core::result::AppResult;
use crate::core::types::{UserIdentity, WalletRecord};
use crate::infrastructure::security::SecretCodec;

/// Zeroes the borrowed buffer when dropped
struct WipeGuard<'a>(&'a mut [u8]);

impl Drop for WipeGuard<'_> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Run `op` over `buffer`, then wipe it whatever `op` does (including panicking)
pub fn with_secret_scope<R>(buffer: &mut [u8], op: impl FnOnce(&[u8]) -> R) -> R {
    let guard = WipeGuard(buffer);
    op(&*guard.0)
}

/// Rebuild the keypair from `secret` and hand it to `op`; `secret` is zero afterwards
fn sign_with_secret<T, F>(secret: &mut [u8], op: F) -> AppResult<T>
where
    F: FnOnce(&Keypair) -> AppResult<T>,
{
    with_secret_scope(secret, |bytes| {
        #[allow(deprecated)]
        let keypair = Keypair::from_bytes(bytes)
            .map_err(|e| AppError::format(format!("Stored key material is not a keypair: {e}")))?;
        op(&keypair)
    })
}

/// Custodian of per-identity keypairs
pub struct WalletCustody {
    store: Arc<dyn WalletStore>,
    codec: SecretCodec,
}

impl WalletCustody {
    /// Create a custodian over `store`
    pub fn new(store: Arc<dyn WalletStore>, codec: SecretCodec) -> Self {
        Self { store, codec }
    }

    /// Generate, encrypt and persist a fresh keypair
    ///
    /// Fails with `AlreadyExists` when the identity already has a wallet.
    #[instrument(skip(self, password), fields(identity = %identity))]
    pub async fn create_wallet(&self, identity: &UserIdentity, password: &str) -> AppResult<WalletRecord> {
        if self.store.find_record(identity).await?.is_some() {
            return Err(AppError::already_exists("You already have a wallet."));
        }

        let keypair = Keypair::new();
        let public_key = keypair.pubkey().to_string();
        let secret = Zeroizing::new(keypair.to_bytes());
        let password = Zeroizing::new(password.to_string());
        let codec = self.codec;

        let encrypted_secret = tokio::task::spawn_blocking(move || codec.encrypt(&secret[..], &password))
            .await
            .map_err(|e| AppError::internal(format!("Encryption task failed: {e}")))??;

        let record = WalletRecord {
            identity: identity.clone(),
            public_key,
            encrypted_secret,
            created_at: Utc::now(),
        };

        self.store.create_record(&record).await?;
        info!("🔐 Created wallet {}", record.public_key);

        Ok(record)
    }

    /// Public key of an identity's wallet
    pub async fn public_key(&self, identity: &UserIdentity) -> AppResult<Pubkey> {
        let record = self.require_record(identity).await?;
        Pubkey::from_str(&record.public_key)
            .map_err(|e| AppError::format(format!("Stored public key is invalid: {e}")))
    }

    /// Whether the identity has a wallet
    pub async fn has_wallet(&self, identity: &UserIdentity) -> AppResult<bool> {
        Ok(self.store.find_record(identity).await?.is_some())
    }

    /// Decrypt the identity's keypair and run `op` with it
    ///
    /// The decrypted buffer lives only for the duration of `op` and is
    /// zeroed before this returns, whether `op` succeeds or not.
    #[instrument(skip(self, password, op), fields(identity = %identity))]
    pub async fn with_keypair<T, F>(&self, identity: &UserIdentity, password: &str, op: F) -> AppResult<T>
    where
        F: FnOnce(&Keypair) -> AppResult<T>,
    {
        let record = self.require_record(identity).await?;
        let password = Zeroizing::new(password.to_string());
        let codec = self.codec;
        let blob = record.encrypted_secret;

        let mut secret = tokio::task::spawn_blocking(move || codec.decrypt(&blob, &password))
            .await
            .map_err(|e| AppError::internal(format!("Decryption task failed: {e}")))?
            .map_err(|e| {
                warn!("Wallet unlock failed: {}", e);
                AppError::from(e)
            })?;

        sign_with_secret(secret.as_mut_slice(), op)
    }

    async fn require_record(&self, identity: &UserIdentity) -> AppResult<WalletRecord> {
        self.store
            .find_record(identity)
            .await?
            .ok_or_else(|| AppError::not_found("wallet", "No wallet found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::InMemoryWalletStore;
    use crate::utils::crypto::KdfParams;
    use assert_matches::assert_matches;
    use solana_sdk::message::Message;
    use solana_sdk::system_instruction;
    use solana_sdk::transaction::Transaction;

    fn custody() -> WalletCustody {
        WalletCustody::new(
            Arc::new(InMemoryWalletStore::new()),
            SecretCodec::new(KdfParams::insecure_for_tests()),
        )
    }

    #[tokio::test]
    async fn test_create_and_unlock() {
        let custody = custody();
        let identity = UserIdentity::new("42");

        let record = custody.create_wallet(&identity, "hunter2hunter2").await.unwrap();
        assert_eq!(custody.public_key(&identity).await.unwrap().to_string(), record.public_key);

        let signer = custody
            .with_keypair(&identity, "hunter2hunter2", |kp| Ok(kp.pubkey().to_string()))
            .await
            .unwrap();
        assert_eq!(signer, record.public_key);
    }

    #[tokio::test]
    async fn test_second_create_is_rejected() {
        let custody = custody();
        let identity = UserIdentity::new("42");

        custody.create_wallet(&identity, "hunter2hunter2").await.unwrap();
        assert_matches!(
            custody.create_wallet(&identity, "another-password").await,
            Err(AppError::AlreadyExists { .. })
        );
    }

    #[tokio::test]
    async fn test_missing_wallet_is_not_found() {
        let custody = custody();
        let result = custody.with_keypair(&UserIdentity::new("7"), "whatever1", |_| Ok(())).await;
        assert_matches!(result, Err(AppError::NotFound { ref entity, .. }) if entity == "wallet");
    }

    #[tokio::test]
    async fn test_wrong_password_is_authentication_error() {
        let custody = custody();
        let identity = UserIdentity::new("42");
        custody.create_wallet(&identity, "hunter2hunter2").await.unwrap();

        let result = custody.with_keypair(&identity, "hunter3hunter3", |_| Ok(())).await;
        assert_matches!(result, Err(AppError::Authentication { .. }));
    }

    #[tokio::test]
    async fn test_signing_inside_scope() {
        let custody = custody();
        let identity = UserIdentity::new("42");
        custody.create_wallet(&identity, "hunter2hunter2").await.unwrap();

        let owner = custody.public_key(&identity).await.unwrap();
        let ix = system_instruction::transfer(&owner, &Pubkey::new_unique(), 1);
        let mut tx = Transaction::new_unsigned(Message::new(&[ix], Some(&owner)));

        custody
            .with_keypair(&identity, "hunter2hunter2", |kp| {
                tx.try_sign(&[kp], solana_sdk::hash::Hash::default())
                    .map_err(|e| AppError::internal(e.to_string()))
            })
            .await
            .unwrap();

        assert!(tx.is_signed());
    }

    #[test]
    fn test_secret_is_wiped_after_success() {
        let keypair = Keypair::new();
        let mut secret = keypair.to_bytes().to_vec();

        let signer = sign_with_secret(&mut secret, |kp| Ok(kp.pubkey())).unwrap();

        assert_eq!(signer, keypair.pubkey());
        assert!(secret.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_secret_is_wiped_when_operation_fails() {
        let codec = SecretCodec::new(KdfParams::insecure_for_tests());
        let blob = codec.encrypt(&Keypair::new().to_bytes(), "hunter2hunter2").unwrap();
        let mut secret = codec.decrypt(&blob, "hunter2hunter2").unwrap();
        assert!(secret.iter().any(|b| *b != 0));

        let result: AppResult<()> =
            sign_with_secret(secret.as_mut_slice(), |_| Err(AppError::upstream("solana-rpc", "rejected")));

        assert_matches!(result, Err(AppError::Upstream { .. }));
        assert!(secret.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_secret_is_wiped_when_operation_panics() {
        let mut secret = vec![0xAAu8; 64];

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            with_secret_scope(&mut secret, |_| panic!("signer blew up"));
        }));

        assert!(outcome.is_err());
        assert!(secret.iter().all(|b| *b == 0));
    }
}
