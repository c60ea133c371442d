use super::TransactionalConnection;
use crate::error::SqlTxnError;
use crate::mapper;
use crate::results::{ResultSet, Row};
use crate::types::RowValues;

impl TransactionalConnection {
    /// Execute a DML statement and return rows affected.
    ///
    /// # Errors
    /// Returns the driver's error if preparing or executing the statement fails.
    pub fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, SqlTxnError> {
        tracing::trace!(sql, params = params.len(), "execute");
        self.raw_mut()?.execute(sql, params)
    }

    /// Execute several statements separated by `;`, without parameters.
    ///
    /// # Errors
    /// Returns the driver's error if any statement fails.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), SqlTxnError> {
        tracing::trace!(sql, "execute batch");
        self.raw_mut()?.execute_batch(sql)
    }

    /// Run a query and return every row, fully fetched.
    ///
    /// # Errors
    /// Returns the driver's error if preparing, executing, or fetching fails.
    pub fn query_result(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlTxnError> {
        tracing::trace!(sql, params = params.len(), "query");
        self.raw_mut()?.query(sql, params)
    }

    /// Run a query and map every row with `transform`.
    ///
    /// # Errors
    /// Returns the driver's error, or the first error from `transform`.
    pub fn query_rows<T, F>(
        &mut self,
        sql: &str,
        params: &[RowValues],
        transform: F,
    ) -> Result<Vec<T>, SqlTxnError>
    where
        F: FnMut(&Row) -> Result<T, SqlTxnError>,
    {
        let result_set = self.query_result(sql, params)?;
        mapper::map_rows(&result_set, transform)
    }

    /// Run a query and map its first row; `None` when nothing matched.
    ///
    /// # Errors
    /// Returns the driver's error, or the error from `transform`.
    pub fn query_row<T, F>(
        &mut self,
        sql: &str,
        params: &[RowValues],
        transform: F,
    ) -> Result<Option<T>, SqlTxnError>
    where
        F: FnOnce(&Row) -> Result<T, SqlTxnError>,
    {
        let result_set = self.query_result(sql, params)?;
        mapper::map_first(&result_set, transform)
    }

    /// First column of the first row.
    ///
    /// `None` when the query matched no rows, `Some(RowValues::Null)` when the
    /// matched cell is null.
    ///
    /// # Errors
    /// Returns the driver's error if the query fails.
    pub fn query_cell(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<RowValues>, SqlTxnError> {
        let result_set = self.query_result(sql, params)?;
        mapper::first_cell(&result_set)
    }
}
