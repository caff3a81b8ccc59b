//! Database session
//!
//! `AsyncConnection` owns one engine session. Data-modifying statements run
//! inside a transaction that is begun implicitly and only ends through
//! `commit`, `rollback` or `close`; anything left pending when the session
//! goes away is discarded by the engine.

use crate::{
    config::ConnectParams,
    cursor::Cursor,
    error::{DatabaseError, Result},
    hook::ExecutionHook,
};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};
use turso::{Builder, Connection};

/// Open a session described by `params`
pub async fn connect(params: ConnectParams) -> Result<AsyncConnection> {
    params.validate()?;
    let seconds = params.timeout_secs;
    with_deadline(seconds, open(params)).await
}

/// Bound `work` by `seconds`, failing with `DatabaseError::Timeout` when it
/// has not finished by then
async fn with_deadline<T>(seconds: u64, work: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(Duration::from_secs(seconds), work).await {
        Ok(result) => result,
        Err(_) => {
            warn!("[DB] Connecting did not finish within {seconds}s");
            Err(DatabaseError::timeout(seconds))
        }
    }
}

async fn open(params: ConnectParams) -> Result<AsyncConnection> {
    info!(
        "[DB] Connecting as '{}' to {}: {}",
        params.user,
        params.database_type(),
        params.dsn
    );

    if !params.is_memory() {
        if let Some(parent) = Path::new(&params.dsn).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    DatabaseError::filesystem(parent.to_string_lossy(), e)
                })?;
            }
        }
    }

    let db = Builder::new_local(&params.dsn).build().await.map_err(|e| {
        DatabaseError::connection_with_source(
            format!("Failed to open database: {}", params.dsn),
            e,
        )
    })?;

    let conn = db.connect().map_err(|e| {
        DatabaseError::connection_with_source("Failed to establish database connection", e)
    })?;

    Ok(AsyncConnection {
        conn,
        params,
        in_transaction: AtomicBool::new(false),
        hook: None,
    })
}

/// An open database session
pub struct AsyncConnection {
    conn: Connection,
    params: ConnectParams,
    in_transaction: AtomicBool,
    hook: Option<Arc<dyn ExecutionHook>>,
}

impl AsyncConnection {
    /// Install a hook that observes every cursor of this connection
    pub fn with_hook<H: ExecutionHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Acquire a cursor. It is released when dropped or closed.
    pub fn cursor(&self) -> Cursor<'_> {
        debug!("[DB] Cursor acquired");
        Cursor::new(self)
    }

    /// Parameters the session was opened with
    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    /// Whether data-modifying work is pending
    pub fn in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::SeqCst)
    }

    /// Make pending work durable. A no-op when nothing is pending.
    pub async fn commit(&self) -> Result<()> {
        self.finish_transaction("COMMIT").await
    }

    /// Discard pending work. A no-op when nothing is pending.
    pub async fn rollback(&self) -> Result<()> {
        self.finish_transaction("ROLLBACK").await
    }

    /// Discard pending work and end the session
    pub async fn close(self) -> Result<()> {
        self.rollback().await?;
        info!("[DB] Connection to {} closed", self.params.dsn);
        Ok(())
    }

    pub(crate) fn raw(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn hook(&self) -> Option<&dyn ExecutionHook> {
        self.hook.as_deref()
    }

    /// Begin the implicit transaction a data-modifying statement runs in
    pub(crate) async fn begin_if_needed(&self) -> Result<()> {
        if self.in_transaction() {
            return Ok(());
        }
        self.conn
            .execute("BEGIN", ())
            .await
            .map_err(|e| DatabaseError::transaction("Failed to begin transaction", e))?;
        self.in_transaction.store(true, Ordering::SeqCst);
        debug!("[DB] Transaction begun");
        Ok(())
    }

    async fn finish_transaction(&self, statement: &str) -> Result<()> {
        if !self.in_transaction() {
            return Ok(());
        }
        self.conn.execute(statement, ()).await.map_err(|e| {
            DatabaseError::transaction(format!("Failed to {}", statement.to_lowercase()), e)
        })?;
        self.in_transaction.store(false, Ordering::SeqCst);
        debug!("[DB] Transaction ended with {statement}");
        Ok(())
    }
}

impl Drop for AsyncConnection {
    fn drop(&mut self) {
        if self.in_transaction() {
            warn!(
                "[DB] Connection to {} dropped with uncommitted changes, discarding them",
                self.params.dsn
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future;

    #[tokio::test]
    async fn test_stalled_work_times_out() {
        let result = with_deadline(0, future::pending::<Result<()>>()).await;
        assert!(matches!(result, Err(DatabaseError::Timeout { seconds: 0 })));
    }

    #[tokio::test]
    async fn test_finished_work_passes_through() {
        assert_eq!(with_deadline(5, async { Ok(7) }).await.unwrap(), 7);

        let result = with_deadline::<()>(5, async { Err(DatabaseError::NoResultSet) }).await;
        assert!(matches!(result, Err(DatabaseError::NoResultSet)));
    }
}
