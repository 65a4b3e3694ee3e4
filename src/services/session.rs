//! In-process conversation state and per-identity serialization

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::repository::ConversationStore;
use crate::core::result::AppResult;
use crate::core::types::{ConversationEntry, UserIdentity};

/// Concurrent-map conversation store for a single bot instance
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    entries: DashMap<UserIdentity, ConversationEntry>,
    pool_pending: DashSet<UserIdentity>,
}

impl MemoryConversationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get(&self, identity: &UserIdentity) -> AppResult<Option<ConversationEntry>> {
        Ok(self.entries.get(identity).map(|e| e.value().clone()))
    }

    async fn set(&self, identity: &UserIdentity, entry: ConversationEntry) -> AppResult<()> {
        self.entries.insert(identity.clone(), entry);
        Ok(())
    }

    async fn clear(&self, identity: &UserIdentity) -> AppResult<()> {
        self.entries.remove(identity);
        Ok(())
    }

    async fn mark_pool_pending(&self, identity: &UserIdentity) -> AppResult<()> {
        self.pool_pending.insert(identity.clone());
        Ok(())
    }

    async fn take_pool_pending(&self, identity: &UserIdentity) -> AppResult<bool> {
        Ok(self.pool_pending.remove(identity).is_some())
    }
}

/// One async mutex per identity
///
/// Holding the guard for a whole transition makes a double-send wait for the
/// previous message to finish instead of racing it. Entries are never
/// evicted; the map grows with the number of distinct users seen.
#[derive(Debug, Default, Clone)]
pub struct IdentityLocks {
    locks: Arc<DashMap<UserIdentity, Arc<Mutex<()>>>>,
}

impl IdentityLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `identity`
    pub async fn acquire(&self, identity: &UserIdentity) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(identity.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FlowStep;
    use std::time::Duration;

    #[tokio::test]
    async fn test_identities_are_isolated() {
        let store = Arc::new(MemoryConversationStore::new());
        let alice = UserIdentity::new("1");
        let bob = UserIdentity::new("2");

        let mut handles = Vec::new();
        for (identity, token) in [(alice.clone(), "SOL"), (bob.clone(), "USDC")] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut entry = ConversationEntry::new(FlowStep::AwaitingAmount);
                entry.payload.input_token = Some(token.to_string());
                store.set(&identity, entry).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let a = store.get(&alice).await.unwrap().unwrap();
        let b = store.get(&bob).await.unwrap().unwrap();
        assert_eq!(a.payload.input_token.as_deref(), Some("SOL"));
        assert_eq!(b.payload.input_token.as_deref(), Some("USDC"));

        store.clear(&alice).await.unwrap();
        assert!(store.get(&alice).await.unwrap().is_none());
        assert!(store.get(&bob).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_pool_pending_is_taken_once() {
        let store = MemoryConversationStore::new();
        let identity = UserIdentity::new("1");

        assert!(!store.take_pool_pending(&identity).await.unwrap());
        store.mark_pool_pending(&identity).await.unwrap();
        assert!(store.take_pool_pending(&identity).await.unwrap());
        assert!(!store.take_pool_pending(&identity).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_identity_is_serialized() {
        let locks = IdentityLocks::new();
        let identity = UserIdentity::new("1");

        let guard = locks.acquire(&identity).await;
        let other = locks.clone();
        let waiter = {
            let identity = identity.clone();
            tokio::spawn(async move {
                let _guard = other.acquire(&identity).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // a different identity is not blocked
        let _unrelated = tokio::time::timeout(Duration::from_secs(1), locks.acquire(&UserIdentity::new("2")))
            .await
            .unwrap();

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }
}
