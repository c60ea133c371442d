//! A single database connection with nested transaction scopes.

use std::fmt;
use std::num::NonZeroU32;

use crate::datasource::DataSource;
use crate::driver::RawConnection;
use crate::encoding::{self, SqlLiteral};
use crate::error::SqlTxnError;
use crate::quoting::{self, ColumnRef, TableRef};
use crate::types::RowValues;

mod query;
mod tx;

/// Transaction state of a [`TransactionalConnection`].
///
/// Only `begin`, `commit`, and `rollback` move between states. A pending
/// rollback cannot exist without an open transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxState {
    /// No transaction; the driver is in autocommit mode.
    #[default]
    Idle,
    /// `depth` logical scopes are open and none has rolled back.
    Active { depth: NonZeroU32 },
    /// `depth` logical scopes are open and a nested scope rolled back, so the
    /// outermost commit will roll back instead.
    RollbackPending { depth: NonZeroU32 },
}

impl TxState {
    /// Number of open logical scopes; 0 when idle.
    #[must_use]
    pub fn depth(self) -> u32 {
        match self {
            TxState::Idle => 0,
            TxState::Active { depth } | TxState::RollbackPending { depth } => depth.get(),
        }
    }

    #[must_use]
    pub fn is_rollback_pending(self) -> bool {
        matches!(self, TxState::RollbackPending { .. })
    }
}

/// Owns one raw driver connection and tracks nested transaction scopes over it.
///
/// Only the outermost scope reaches the driver: nested `begin`/`commit` pairs
/// are counted, and a nested `rollback` forces the outermost commit to roll
/// back instead.
///
/// ```rust
/// use sql_txn::prelude::*;
///
/// let source = DataSource::url(":memory:", DriverKind::Sqlite);
/// let mut conn = TransactionalConnection::open(&source)?;
/// conn.execute_batch("CREATE TABLE t (id INTEGER)")?;
///
/// conn.begin()?;
/// conn.execute("INSERT INTO t (id) VALUES (?1)", &[RowValues::Int(1)])?;
/// conn.begin()?;
/// conn.rollback()?;
/// assert!(conn.commit()?, "nested rollback turns the outer commit into a rollback");
///
/// assert_eq!(conn.query_cell("SELECT COUNT(*) FROM t", &[])?, Some(RowValues::Int(0)));
/// conn.close()?;
/// # Ok::<(), SqlTxnError>(())
/// ```
pub struct TransactionalConnection {
    raw: Option<Box<dyn RawConnection>>,
    state: TxState,
}

impl TransactionalConnection {
    /// Adopt an already-open raw connection.
    #[must_use]
    pub fn new(raw: Box<dyn RawConnection>) -> Self {
        Self {
            raw: Some(raw),
            state: TxState::Idle,
        }
    }

    /// Acquire a raw connection from `source` without binding it to any context.
    ///
    /// # Errors
    /// Returns `SqlTxnError::ConnectionError` (or `ConfigError`) if no connection can be made.
    pub fn open(source: &DataSource) -> Result<Self, SqlTxnError> {
        let raw = source.open()?;
        tracing::debug!(?source, "connection opened");
        Ok(Self::new(raw))
    }

    #[must_use]
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Current transaction nesting depth.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.state.depth()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.state != TxState::Idle
    }

    /// Release the raw connection.
    ///
    /// A transaction still open at this point is aborted: the driver is told to
    /// roll back before the connection is closed.
    ///
    /// # Errors
    /// Returns the driver's error if the connection does not close cleanly.
    pub fn close(mut self) -> Result<(), SqlTxnError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), SqlTxnError> {
        let Some(mut raw) = self.raw.take() else {
            return Ok(());
        };
        let depth = self.state.depth();
        if depth > 0 {
            tracing::warn!(depth, "closing connection with an open transaction; rolling back");
            self.state = TxState::Idle;
            if let Err(err) = raw.rollback() {
                tracing::warn!(error = %err, "rollback before close failed");
            }
        }
        raw.close()?;
        tracing::debug!("connection closed");
        Ok(())
    }

    pub(crate) fn raw_mut(&mut self) -> Result<&mut (dyn RawConnection + 'static), SqlTxnError> {
        match self.raw.as_deref_mut() {
            Some(raw) => Ok(raw),
            None => Err(SqlTxnError::ConnectionError("connection is closed".into())),
        }
    }

    #[must_use]
    pub fn quote_table(&self, name: &str, alias: Option<&str>) -> String {
        quoting::quote_table(name, alias)
    }

    #[must_use]
    pub fn quote_tables<I, T>(&self, tables: I, with_brackets: bool) -> String
    where
        I: IntoIterator<Item = T>,
        T: Into<TableRef>,
    {
        quoting::quote_tables(tables, with_brackets)
    }

    #[must_use]
    pub fn quote_column(&self, expression: &str, alias: Option<&str>) -> String {
        quoting::quote_column(expression, alias)
    }

    #[must_use]
    pub fn quote_columns<I, T>(&self, columns: I, with_brackets: bool) -> String
    where
        I: IntoIterator<Item = T>,
        T: Into<ColumnRef>,
    {
        quoting::quote_columns(columns, with_brackets)
    }

    /// See [`encoding::quote`]; text is embedded without escaping.
    #[must_use]
    pub fn quote(&self, value: &RowValues) -> SqlLiteral {
        encoding::quote(value)
    }

    #[must_use]
    pub fn quote_list<'a, I>(&self, values: I) -> String
    where
        I: IntoIterator<Item = &'a RowValues>,
    {
        encoding::quote_list(values)
    }
}

impl Drop for TransactionalConnection {
    fn drop(&mut self) {
        if self.raw.is_some()
            && let Err(err) = self.shutdown()
        {
            tracing::warn!(error = %err, "closing dropped connection failed");
        }
    }
}

impl fmt::Debug for TransactionalConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionalConnection")
            .field("open", &self.raw.is_some())
            .field("state", &self.state)
            .finish()
    }
}
