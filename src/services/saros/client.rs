//! HTTP client for the liquidity-book SDK gateway
//!
//! The gateway exposes the Saros DLMM SDK over JSON:
//!
//! | Operation | Route |
//! |---|---|
//! | pool addresses | `GET /pools` |
//! | pool metadata | `GET /pools/{address}` |
//! | quote | `POST /quote/{route}` |
//! | swap transaction | `POST /swap` |
//! | user positions | `POST /positions` |
//! | pair creation | `POST /pairs` |

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::types::{
    extract_pair_address, CreatePairRequest, CreatedPair, PoolMetadata, PositionInfo, QuoteRequest,
    RawQuote, SwapRequest, UnsignedTransaction, LIQUIDITY_BOOK,
};
use super::LiquidityBook;
use crate::config::models::LiquidityBookConfig;
use crate::core::error::AppError;
use crate::core::result::AppResult;

/// Maximum concurrent gateway requests
const MAX_CONCURRENT_REQUESTS: usize = 8;

/// Statuses meaning "this quote route does not exist"
const MISSING_ROUTE: [StatusCode; 3] =
    [StatusCode::NOT_FOUND, StatusCode::METHOD_NOT_ALLOWED, StatusCode::NOT_IMPLEMENTED];

#[derive(Deserialize)]
struct TransactionResponse {
    transaction: String,
}

#[derive(Deserialize)]
struct CreatePairResponse {
    transaction: String,
    #[serde(default)]
    pair: Value,
}

#[derive(Serialize)]
struct PositionsRequest<'a> {
    payer: &'a str,
    pair: &'a str,
}

/// Liquidity-book client over the SDK gateway
#[derive(Debug, Clone)]
pub struct HttpLiquidityBook {
    /// HTTP client
    http_client: Client,
    /// Gateway base URL without trailing slash
    base_url: String,
    /// Candidate quote routes, in priority order
    quote_routes: Vec<String>,
    /// Request semaphore for rate limiting
    semaphore: Arc<Semaphore>,
}

impl HttpLiquidityBook {
    /// Create a new gateway client
    pub fn new(config: &LiquidityBookConfig) -> AppResult<Self> {
        info!("🌊 Initializing liquidity-book client: {}", config.base_url);

        let http_client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            quote_routes: config.quote_routes.clone(),
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn permit(&self) -> AppResult<tokio::sync::SemaphorePermit<'_>> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| AppError::internal("Failed to acquire liquidity-book semaphore"))
    }

    async fn execute_get<T>(&self, path: &str) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let _permit = self.permit().await?;
        let response = self.http_client.get(self.url(path)).send().await?;
        Self::parse(response).await
    }

    async fn execute_post<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let _permit = self.permit().await?;
        let response = self.http_client.post(self.url(path)).json(body).send().await?;
        Self::parse(response).await
    }

    async fn parse<T>(response: Response) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                AppError::upstream(LIQUIDITY_BOOK, format!("Failed to parse response: {e}"))
                    .with_status(status.as_u16())
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::upstream(LIQUIDITY_BOOK, error_message(status, &body)).with_status(status.as_u16()))
    }
}

/// Prefer the gateway's own `error`/`message` field over the raw body
fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["error", "message"]
            .iter()
            .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
    });

    match detail {
        Some(message) => message,
        None if body.trim().is_empty() => format!("Liquidity-book gateway error ({status})"),
        None => format!("Liquidity-book gateway error ({status}): {}", body.trim()),
    }
}

#[async_trait]
impl LiquidityBook for HttpLiquidityBook {
    #[instrument(skip(self))]
    async fn fetch_pool_addresses(&self) -> AppResult<Vec<String>> {
        let pools: Vec<String> = self.execute_get("pools").await?;
        debug!("Fetched {} pool addresses", pools.len());
        Ok(pools)
    }

    #[instrument(skip(self))]
    async fn fetch_pool_metadata(&self, pool: &str) -> AppResult<PoolMetadata> {
        let mut metadata: PoolMetadata = self
            .execute_get(&format!("pools/{pool}"))
            .await
            .map_err(|e| match e {
                AppError::Upstream { status_code: Some(404), .. } => {
                    AppError::not_found("pool", format!("Pool not found: {pool}"))
                }
                other => other,
            })?;

        if metadata.pool_address.is_empty() {
            metadata.pool_address = pool.to_string();
        }
        Ok(metadata)
    }

    #[instrument(skip(self, request), fields(pair = %request.pair))]
    async fn quote(&self, request: &QuoteRequest) -> AppResult<Option<RawQuote>> {
        for route in &self.quote_routes {
            let _permit = self.permit().await?;
            let response = self
                .http_client
                .post(self.url(&format!("quote/{route}")))
                .json(request)
                .send()
                .await?;

            if MISSING_ROUTE.contains(&response.status()) {
                debug!("Quote route {} not available ({})", route, response.status());
                continue;
            }

            let body: Value = Self::parse(response).await?;
            debug!("Quote answered by route {}", route);
            return Ok(Some(RawQuote { route: route.clone(), body }));
        }

        warn!("⚠️  No quote route available on the gateway");
        Ok(None)
    }

    #[instrument(skip(self, request), fields(pair = %request.pair))]
    async fn build_swap_transaction(&self, request: &SwapRequest) -> AppResult<UnsignedTransaction> {
        let response: TransactionResponse = self.execute_post("swap", request).await?;
        Ok(UnsignedTransaction::new(response.transaction))
    }

    #[instrument(skip(self))]
    async fn user_positions(&self, owner: &str, pair: &str) -> AppResult<Vec<PositionInfo>> {
        self.execute_post("positions", &PositionsRequest { payer: owner, pair }).await
    }

    #[instrument(skip(self, request))]
    async fn create_pair(&self, request: &CreatePairRequest) -> AppResult<CreatedPair> {
        let response: CreatePairResponse = self.execute_post("pairs", request).await?;
        let pair_address = extract_pair_address(&response.pair)?;
        info!("🆕 Pair creation transaction built for {}", pair_address);

        Ok(CreatedPair {
            pair_address,
            transaction: UnsignedTransaction::new(response.transaction),
        })
    }
}
