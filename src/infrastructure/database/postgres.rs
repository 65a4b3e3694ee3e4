//! PostgreSQL wallet store implementation
//!
//! This module provides PostgreSQL connectivity, migration management and
//! the persistent [`WalletStore`] used in production.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::config::models::DatabaseConfig;
use crate::core::error::AppError;
use crate::core::repository::WalletStore;
use crate::core::result::{AppResult, ResultExt};
use crate::core::types::{UserIdentity, WalletRecord};

/// PostgreSQL connection pool type alias
pub type PostgresPool = PgPool;

#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    identity: String,
    public_key: String,
    encrypted_secret: String,
    created_at: DateTime<Utc>,
}

impl From<WalletRow> for WalletRecord {
    fn from(row: WalletRow) -> Self {
        Self {
            identity: UserIdentity::new(row.identity),
            public_key: row.public_key,
            encrypted_secret: row.encrypted_secret,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed wallet store
#[derive(Debug, Clone)]
pub struct PostgresWalletStore {
    /// Connection pool
    pool: PgPool,
}

impl PostgresWalletStore {
    /// Create a new store with its own connection pool
    #[instrument(skip(config))]
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        info!("🐘 Initializing PostgreSQL connection pool");

        if config.url.is_empty() {
            return Err(AppError::database("PostgreSQL URL is required", "connection"));
        }

        let connect_options = config
            .url
            .parse::<PgConnectOptions>()
            .map_err(|e| AppError::database(format!("Invalid PostgreSQL connection string: {e}"), "connection"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_millis(config.connection_timeout_ms))
            .idle_timeout(Duration::from_millis(config.idle_timeout_ms))
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await
            .map_err(|e| AppError::database(
                format!("Failed to create PostgreSQL connection pool: {e}"),
                "connection_pool",
            ))?;

        info!("✅ PostgreSQL connection pool established");
        info!("📊 Pool configuration: max={}, min={}", config.max_connections, config.min_connections);

        let store = Self { pool };

        if config.auto_migrate {
            store.migrate().await?;
        }

        Ok(store)
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> AppResult<()> {
        info!("🔄 Running PostgreSQL migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}"), "migration"))?;

        info!("✅ PostgreSQL migrations completed successfully");
        Ok(())
    }

    /// Close all connections in the pool
    pub async fn close(&self) {
        info!("🔌 Closing PostgreSQL connection pool");
        self.pool.close().await;
    }
}

#[async_trait]
impl WalletStore for PostgresWalletStore {
    #[instrument(skip(self, record), fields(identity = %record.identity))]
    async fn create_record(&self, record: &WalletRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO wallets (identity, public_key, encrypted_secret, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.identity.as_str())
        .bind(&record.public_key)
        .bind(&record.encrypted_secret)
        .bind(record.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Stored wallet record");
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::already_exists("A wallet already exists for this account."))
            }
            Err(e) => Err(AppError::database(format!("Failed to insert wallet: {e}"), "create_record")),
        }
    }

    #[instrument(skip(self), fields(identity = %identity))]
    async fn find_record(&self, identity: &UserIdentity) -> AppResult<Option<WalletRecord>> {
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT identity, public_key, encrypted_secret, created_at
            FROM wallets
            WHERE identity = $1
            "#,
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_db_err("find_record")?;

        Ok(row.map(WalletRecord::from))
    }
}
