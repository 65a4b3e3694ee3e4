//! Storage contracts
//!
//! Flow engines and custody are written against these traits; the concrete
//! backends live in `infrastructure::database` and `services::session`.

use crate::core::result::AppResult;
use crate::core::types::{ConversationEntry, UserIdentity, WalletRecord};
use async_trait::async_trait;

/// Persistent wallet record store keyed by identity
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Insert a new record, failing with `AlreadyExists` when the identity has one
    async fn create_record(&self, record: &WalletRecord) -> AppResult<()>;

    /// Look up the record of an identity
    async fn find_record(&self, identity: &UserIdentity) -> AppResult<Option<WalletRecord>>;
}

/// Short-lived per-identity session data
///
/// Every operation is a single point-in-time read or write. Serializing
/// whole transitions per identity is the dispatcher's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Current entry of an identity
    async fn get(&self, identity: &UserIdentity) -> AppResult<Option<ConversationEntry>>;

    /// Replace the entry of an identity
    async fn set(&self, identity: &UserIdentity, entry: ConversationEntry) -> AppResult<()>;

    /// Drop the entry of an identity
    async fn clear(&self, identity: &UserIdentity) -> AppResult<()>;

    /// Add the identity to the pending pool-address set
    async fn mark_pool_pending(&self, identity: &UserIdentity) -> AppResult<()>;

    /// Remove the identity from the pending set, reporting whether it was there
    async fn take_pool_pending(&self, identity: &UserIdentity) -> AppResult<bool>;
}
