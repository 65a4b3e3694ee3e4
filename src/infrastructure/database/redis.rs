//! Redis conversation store implementation
//!
//! This module keeps conversation entries and pending pool requests in
//! Redis so that several bot instances can share one session space.
//! Entries are JSON-encoded and expire after the configured TTL.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, info, instrument};

use crate::config::models::SessionConfig;
use crate::core::error::AppError;
use crate::core::repository::ConversationStore;
use crate::core::result::AppResult;
use crate::core::types::{ConversationEntry, UserIdentity};

/// Redis-backed conversation store
#[derive(Clone)]
pub struct RedisConversationStore {
    /// Shared async connection manager
    connection_manager: ConnectionManager,
    /// Key prefix for every entry
    key_prefix: String,
    /// Entry lifetime in seconds
    ttl_seconds: u64,
}

impl std::fmt::Debug for RedisConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConversationStore")
            .field("key_prefix", &self.key_prefix)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl RedisConversationStore {
    /// Connect to Redis and verify it responds
    #[instrument(skip(config))]
    pub async fn connect(config: &SessionConfig) -> AppResult<Self> {
        info!("🔴 Initializing Redis session store");

        if config.redis_url.is_empty() {
            return Err(AppError::database("Redis URL is required", "validation"));
        }

        let client = Client::open(config.redis_url.as_str())
            .map_err(|e| AppError::database(format!("Failed to create Redis client: {e}"), "client_creation"))?;

        let mut connection_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::database(
                format!("Failed to create Redis connection manager: {e}"),
                "connection_manager",
            ))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut connection_manager)
            .await
            .map_err(|e| AppError::database(format!("Redis ping failed: {e}"), "initial_ping"))?;

        info!("✅ Redis session store ready: prefix='{}', ttl={}s", config.key_prefix, config.ttl_seconds);

        Ok(Self {
            connection_manager,
            key_prefix: config.key_prefix.clone(),
            ttl_seconds: config.ttl_seconds,
        })
    }

    fn state_key(&self, identity: &UserIdentity) -> String {
        format!("{}state:{}", self.key_prefix, identity)
    }

    fn pending_key(&self, identity: &UserIdentity) -> String {
        format!("{}pool_pending:{}", self.key_prefix, identity)
    }
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    #[instrument(skip(self), fields(identity = %identity))]
    async fn get(&self, identity: &UserIdentity) -> AppResult<Option<ConversationEntry>> {
        let mut conn = self.connection_manager.clone();
        let raw: Option<String> = conn.get(self.state_key(identity)).await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, entry), fields(identity = %identity, step = %entry.step))]
    async fn set(&self, identity: &UserIdentity, entry: ConversationEntry) -> AppResult<()> {
        let json = serde_json::to_string(&entry)?;
        let mut conn = self.connection_manager.clone();
        let _: () = conn.set_ex(self.state_key(identity), json, self.ttl_seconds).await?;
        debug!("Stored conversation entry");
        Ok(())
    }

    async fn clear(&self, identity: &UserIdentity) -> AppResult<()> {
        let mut conn = self.connection_manager.clone();
        let _: i64 = conn.del(self.state_key(identity)).await?;
        Ok(())
    }

    async fn mark_pool_pending(&self, identity: &UserIdentity) -> AppResult<()> {
        let mut conn = self.connection_manager.clone();
        let _: () = conn.set_ex(self.pending_key(identity), 1u8, self.ttl_seconds).await?;
        Ok(())
    }

    async fn take_pool_pending(&self, identity: &UserIdentity) -> AppResult<bool> {
        let mut conn = self.connection_manager.clone();
        let removed: i64 = conn.del(self.pending_key(identity)).await?;
        Ok(removed > 0)
    }
}
