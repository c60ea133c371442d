//! Binding connections to execution contexts.
//!
//! A [`ConnectionRegistry`] is owned by whatever handles units of work (a
//! request loop, a test harness) and passed to the code that needs "the
//! current connection". Each context has at most one bound connection.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::connection::TransactionalConnection;
use crate::datasource::DataSource;
use crate::error::SqlTxnError;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// Identifies one logical unit of work, such as a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// A process-unique id.
    #[must_use]
    pub fn next() -> Self {
        ContextId(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ContextId {
    fn from(id: u64) -> Self {
        ContextId(id)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Maps each execution context to its current connection.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    bindings: HashMap<ContextId, TransactionalConnection>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection from `source` and bind it to `ctx`.
    ///
    /// A connection already bound to `ctx` is replaced and closed.
    ///
    /// # Errors
    /// Returns `SqlTxnError::ConnectionError` (or `ConfigError`) if the
    /// connection cannot be made; any existing binding is left untouched.
    pub fn connect(
        &mut self,
        ctx: ContextId,
        source: &DataSource,
    ) -> Result<&mut TransactionalConnection, SqlTxnError> {
        let conn = TransactionalConnection::open(source)?;
        Ok(self.bind(ctx, conn))
    }

    /// Bind an already-open connection to `ctx`, replacing and closing any previous one.
    pub fn bind(&mut self, ctx: ContextId, conn: TransactionalConnection) -> &mut TransactionalConnection {
        if let Some(previous) = self.bindings.remove(&ctx) {
            tracing::warn!(%ctx, "replacing connection already bound to context");
            if let Err(err) = previous.close() {
                tracing::warn!(%ctx, error = %err, "closing replaced connection failed");
            }
        }
        tracing::debug!(%ctx, "connection bound");
        self.bindings.entry(ctx).or_insert(conn)
    }

    /// The connection bound to `ctx`.
    ///
    /// # Errors
    /// Returns `SqlTxnError::NoActiveConnection` if nothing is bound.
    pub fn current(&mut self, ctx: ContextId) -> Result<&mut TransactionalConnection, SqlTxnError> {
        self.bindings
            .get_mut(&ctx)
            .ok_or(SqlTxnError::NoActiveConnection(ctx))
    }

    #[must_use]
    pub fn is_bound(&self, ctx: ContextId) -> bool {
        self.bindings.contains_key(&ctx)
    }

    /// Unbind the connection for `ctx` without closing it.
    pub fn take(&mut self, ctx: ContextId) -> Option<TransactionalConnection> {
        self.bindings.remove(&ctx)
    }

    /// Close the connection bound to `ctx` and clear the binding.
    ///
    /// Closing a context with nothing bound is a no-op.
    ///
    /// # Errors
    /// Returns the driver's error if the connection does not close cleanly; the
    /// binding is cleared regardless.
    pub fn close(&mut self, ctx: ContextId) -> Result<(), SqlTxnError> {
        match self.bindings.remove(&ctx) {
            Some(conn) => {
                tracing::debug!(%ctx, "closing bound connection");
                conn.close()
            }
            None => Ok(()),
        }
    }

    /// Run `body` in a transaction on the connection bound to `ctx`, then close
    /// that connection and clear the binding whatever the outcome.
    ///
    /// # Errors
    /// Returns `SqlTxnError::NoActiveConnection` if nothing is bound, the error
    /// from `body` if it failed, or otherwise the error from `BEGIN`, `COMMIT`,
    /// or closing the connection.
    pub fn run_in_transaction<T, E, F>(&mut self, ctx: ContextId, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut TransactionalConnection) -> Result<T, E>,
        E: From<SqlTxnError>,
    {
        let conn = self
            .bindings
            .remove(&ctx)
            .ok_or(SqlTxnError::NoActiveConnection(ctx))?;
        conn.transaction(body)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Close every bound connection.
    ///
    /// # Errors
    /// Returns the first close failure after attempting all of them.
    pub fn close_all(&mut self) -> Result<(), SqlTxnError> {
        let mut first_err = None;
        for (ctx, conn) in self.bindings.drain() {
            if let Err(err) = conn.close() {
                tracing::warn!(%ctx, error = %err, "closing connection failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
