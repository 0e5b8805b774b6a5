use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

pub mod models;
pub mod queries;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Database operation exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("Transaction failed: {source}; rollback also failed: {rollback}")]
    RollbackFailed {
        source: Box<DbError>,
        rollback: sqlx::Error,
    },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Bounded connection pool plus the transactional execution wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a pool with fixed max open / min idle / max lifetime and
    /// verify connectivity before returning.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        info!("Database connection established");

        Ok(Self { pool })
    }

    /// Open the pool without dialing the server up front. Connections
    /// are established on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Run `work` inside a single transaction, bounded by `deadline`.
    ///
    /// Commits when `work` succeeds (a commit failure is the overall
    /// error). When `work` fails, rolls back explicitly; if the
    /// rollback itself fails, the returned error carries both
    /// failures. When the deadline elapses mid-flight the in-progress
    /// transaction is dropped, which rolls it back before the
    /// connection can be handed out again; partial writes are never
    /// visible either way.
    pub async fn exec_tx<T, F>(&self, deadline: Duration, work: F) -> Result<T, DbError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Transaction<'static, Postgres>) -> BoxFuture<'t, Result<T, DbError>>
            + Send,
    {
        let run = async {
            let mut tx = self.pool.begin().await?;

            match work(&mut tx).await {
                Ok(value) => {
                    tx.commit().await?;
                    Ok(value)
                }
                Err(err) => match tx.rollback().await {
                    Ok(()) => Err(err),
                    Err(rb_err) => Err(DbError::RollbackFailed {
                        source: Box::new(err),
                        rollback: rb_err,
                    }),
                },
            }
        };

        match tokio::time::timeout(deadline, run).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Timeout(deadline)),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
