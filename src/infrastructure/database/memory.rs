//! In-memory wallet store
//!
//! Used in development and tests when no database URL is configured.
//! Records do not survive a restart.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::core::error::AppError;
use crate::core::repository::WalletStore;
use crate::core::result::AppResult;
use crate::core::types::{UserIdentity, WalletRecord};

/// Process-local wallet store
#[derive(Debug, Default)]
pub struct InMemoryWalletStore {
    records: DashMap<UserIdentity, WalletRecord>,
}

impl InMemoryWalletStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored wallets
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no wallet is stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn create_record(&self, record: &WalletRecord) -> AppResult<()> {
        match self.records.entry(record.identity.clone()) {
            Entry::Occupied(_) => Err(AppError::already_exists("A wallet already exists for this account.")),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn find_record(&self, identity: &UserIdentity) -> AppResult<Option<WalletRecord>> {
        Ok(self.records.get(identity).map(|r| r.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn record(id: &str) -> WalletRecord {
        WalletRecord {
            identity: UserIdentity::new(id),
            public_key: format!("pk-{id}"),
            encrypted_secret: "blob".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let store = InMemoryWalletStore::new();
        store.create_record(&record("1")).await.unwrap();

        let found = store.find_record(&UserIdentity::new("1")).await.unwrap().unwrap();
        assert_eq!(found.public_key, "pk-1");
        assert!(store.find_record(&UserIdentity::new("2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_create_conflicts() {
        let store = InMemoryWalletStore::new();
        store.create_record(&record("1")).await.unwrap();

        let mut other = record("1");
        other.public_key = "different".to_string();
        assert_matches!(store.create_record(&other).await, Err(AppError::AlreadyExists { .. }));

        let kept = store.find_record(&UserIdentity::new("1")).await.unwrap().unwrap();
        assert_eq!(kept.public_key, "pk-1");
        assert_eq!(store.len(), 1);
    }
}
