//! Memoized database connection handle.
//!
//! Every consumer (the model loader per attachment root, and `listen` once
//! more) awaits the same handle; the first await connects and later awaits
//! return the cached pool.

use crate::dburl::{parse_db_url, DbUrl};
use crate::error::BootError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Clone)]
pub struct DbHandle {
    url: String,
    max_connections: u32,
    pool: Arc<OnceCell<PgPool>>,
}

impl DbHandle {
    /// Lazy handle: connects on first [`DbHandle::get`].
    pub fn connect(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            pool: Arc::new(OnceCell::new()),
        }
    }

    /// Handle around an existing pool; `url` is kept for diagnostics only.
    pub fn from_pool(pool: PgPool, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            pool: Arc::new(OnceCell::new_with(Some(pool))),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Resolve the pool, connecting at most once across all clones. A hung
    /// connection stalls the caller; there is no timeout here.
    pub async fn get(&self) -> Result<&PgPool, BootError> {
        let pool = self
            .pool
            .get_or_try_init(|| async {
                tracing::debug!("connecting database pool");
                PgPoolOptions::new()
                    .max_connections(self.max_connections)
                    .connect(&self.url)
                    .await
            })
            .await?;
        Ok(pool)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connection metadata for diagnostic logging.
    pub fn info(&self) -> Option<DbUrl> {
        parse_db_url(&self.url)
    }
}
