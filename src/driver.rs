//! The seam between [`TransactionalConnection`](crate::TransactionalConnection) and a database driver.

use std::sync::Arc;

use crate::error::SqlTxnError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// A live, blocking driver connection.
///
/// Implementations only translate calls; nesting and the sticky rollback are
/// handled by `TransactionalConnection`, which calls `begin`/`commit`/`rollback`
/// at most once per outermost scope.
pub trait RawConnection: Send {
    /// Leave autocommit mode and start a transaction.
    ///
    /// # Errors
    /// Returns the driver's error if the transaction cannot be started.
    fn begin(&mut self) -> Result<(), SqlTxnError>;

    /// # Errors
    /// Returns the driver's error if the commit fails.
    fn commit(&mut self) -> Result<(), SqlTxnError>;

    /// # Errors
    /// Returns the driver's error if the rollback fails.
    fn rollback(&mut self) -> Result<(), SqlTxnError>;

    /// Run a data-modification statement with positional parameters.
    ///
    /// # Errors
    /// Returns the driver's error if preparing or executing fails.
    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, SqlTxnError>;

    /// Run several statements with no parameters.
    ///
    /// # Errors
    /// Returns the driver's error if any statement fails.
    fn execute_batch(&mut self, sql: &str) -> Result<(), SqlTxnError>;

    /// Run a query and fetch every row.
    ///
    /// # Errors
    /// Returns the driver's error if preparing, executing, or fetching fails.
    fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlTxnError>;

    /// Release the connection.
    ///
    /// # Errors
    /// Returns the driver's error if the connection did not close cleanly.
    fn close(self: Box<Self>) -> Result<(), SqlTxnError>;
}

/// Produces raw connections on demand, standing in for a pre-built data source.
pub trait ConnectionFactory: Send + Sync {
    /// # Errors
    /// Returns `SqlTxnError::ConnectionError` (or the driver's error) when no connection can be made.
    fn open(&self) -> Result<Box<dyn RawConnection>, SqlTxnError>;
}

impl<F> ConnectionFactory for F
where
    F: Fn() -> Result<Box<dyn RawConnection>, SqlTxnError> + Send + Sync,
{
    fn open(&self) -> Result<Box<dyn RawConnection>, SqlTxnError> {
        self()
    }
}

/// Shared handle to a connection factory.
pub type SharedFactory = Arc<dyn ConnectionFactory>;
