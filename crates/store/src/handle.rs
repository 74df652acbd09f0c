//! Short-lived access to the order store.
//!
//! A [`StoreHandle`] owns exactly one PostgreSQL connection. There is no
//! pool: every status poll opens its own handle and closes it again, so no
//! connection outlives the operation that needed it. [`with_store`] wraps that
//! acquire/use/release cycle and closes the handle on every exit path.
//!
//! The store is read-only from orderprobe's point of view; the only
//! statements issued are the status lookup and `SELECT 1`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use tracing::{debug, warn};

use orderprobe_core::config::StoreConfig;
use orderprobe_core::types::OrderId;

use crate::error::StoreError;

/// The `Id` column's type belongs to the order service's schema, so the
/// comparison happens on its text form.
const STATUS_QUERY: &str = r#"SELECT "Status" FROM "Orders" WHERE "Id"::text = $1"#;

/// Future returned by a [`with_store`] closure.
pub type StoreFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'c>>;

/// One private connection to the order store.
///
/// Dropping a handle without calling [`close`](Self::close) still releases
/// the socket; `close` additionally performs the protocol-level goodbye.
pub struct StoreHandle {
    conn: PgConnection,
    target: String,
}

impl StoreHandle {
    /// Open a connection, bounded by `connect_timeout_secs`.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let target = config.target();
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);

        let timeout = Duration::from_secs(config.connect_timeout_secs);
        let conn = tokio::time::timeout(timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| StoreError::Connect {
                target: target.clone(),
                reason: format!("timed out after {}s", config.connect_timeout_secs),
            })?
            .map_err(|e| StoreError::Connect {
                target: target.clone(),
                reason: e.to_string(),
            })?;

        debug!(target = %target, "store connection opened");
        Ok(Self { conn, target })
    }

    /// Raw status code of `order_id`, or `None` when no row exists yet.
    pub async fn fetch_status(&mut self, order_id: &OrderId) -> Result<Option<i32>, StoreError> {
        sqlx::query_scalar::<_, i32>(STATUS_QUERY)
            .bind(order_id.as_str())
            .fetch_optional(&mut self.conn)
            .await
            .map_err(|e| StoreError::Query {
                order_id: order_id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn select_one(&mut self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Ping {
                target: self.target.clone(),
                reason: e.to_string(),
            })
    }

    /// Close the connection.
    pub async fn close(self) -> Result<(), StoreError> {
        let target = self.target;
        self.conn
            .close()
            .await
            .map_err(|e| StoreError::Close(e.to_string()))?;
        debug!(target = %target, "store connection closed");
        Ok(())
    }

    /// Startup connectivity check: acquire, `SELECT 1`, release.
    pub async fn ping(config: &StoreConfig) -> Result<(), StoreError> {
        with_store(config, |handle| Box::pin(handle.select_one())).await
    }
}

/// Acquire a handle, run `f` with it, then close it whatever `f` returned.
///
/// A failure to close is logged; it never replaces the closure's result.
///
/// ```ignore
/// let id = order_id.clone();
/// let code = with_store(&config, move |handle| {
///     Box::pin(async move { handle.fetch_status(&id).await })
/// })
/// .await?;
/// ```
pub async fn with_store<T, F>(config: &StoreConfig, f: F) -> Result<T, StoreError>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut StoreHandle) -> StoreFuture<'c, T> + Send,
{
    let mut handle = StoreHandle::connect(config).await?;
    let result = f(&mut handle).await;
    if let Err(e) = handle.close().await {
        warn!(error = %e, "store handle did not close cleanly");
    }
    result
}
