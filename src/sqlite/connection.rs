use std::fmt;

use rusqlite::{Connection, OpenFlags};

use super::config::SqliteOptions;
use super::params::Params;
use super::query::build_result_set;
use crate::driver::RawConnection;
use crate::error::SqlTxnError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// A single rusqlite connection driven through [`RawConnection`].
pub struct SqliteConnection {
    conn: Connection,
    db_path: String,
}

impl SqliteConnection {
    /// Open a connection and apply the connection-level pragmas.
    ///
    /// # Errors
    /// Returns `SqlTxnError::ConnectionError` if the database cannot be opened or configured.
    pub fn open(opts: &SqliteOptions) -> Result<Self, SqlTxnError> {
        let opened = if opts.is_memory() {
            Connection::open_in_memory()
        } else {
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            Connection::open_with_flags(&opts.db_path, flags)
        };
        let conn = opened.map_err(|e| {
            SqlTxnError::ConnectionError(format!("failed to open SQLite {}: {e}", opts.db_path))
        })?;

        configure(&conn, opts).map_err(|e| {
            SqlTxnError::ConnectionError(format!(
                "failed to configure SQLite {}: {e}",
                opts.db_path
            ))
        })?;

        tracing::debug!(db_path = %opts.db_path, "opened sqlite connection");
        Ok(Self {
            conn,
            db_path: opts.db_path.clone(),
        })
    }

    /// Adopt an already-open rusqlite connection; `db_path` is only used in logs.
    #[must_use]
    pub fn from_connection(conn: Connection, db_path: impl Into<String>) -> Self {
        Self {
            conn,
            db_path: db_path.into(),
        }
    }

    /// Borrow the underlying rusqlite connection.
    #[must_use]
    pub fn raw(&self) -> &Connection {
        &self.conn
    }

    #[must_use]
    pub fn db_path(&self) -> &str {
        &self.db_path
    }
}

fn configure(conn: &Connection, opts: &SqliteOptions) -> rusqlite::Result<()> {
    if let Some(timeout) = opts.busy_timeout {
        conn.busy_timeout(timeout)?;
    }
    if opts.foreign_keys {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    }
    if opts.journal_wal && !opts.is_memory() {
        conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get::<_, String>(0))?;
    }
    Ok(())
}

impl RawConnection for SqliteConnection {
    fn begin(&mut self) -> Result<(), SqlTxnError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlTxnError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlTxnError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, SqlTxnError> {
        let converted = Params::convert(params);
        let mut stmt = self.conn.prepare_cached(sql)?;
        let affected = stmt.execute(&converted.as_refs()[..])?;
        Ok(affected)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), SqlTxnError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, SqlTxnError> {
        let converted = Params::convert(params);
        let mut stmt = self.conn.prepare_cached(sql)?;
        build_result_set(&mut stmt, converted.as_values())
    }

    fn close(self: Box<Self>) -> Result<(), SqlTxnError> {
        let SqliteConnection { conn, db_path } = *self;
        conn.close().map_err(|(_, e)| {
            SqlTxnError::ConnectionError(format!("failed to close SQLite {db_path}: {e}"))
        })?;
        tracing::debug!(db_path = %db_path, "closed sqlite connection");
        Ok(())
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("db_path", &self.db_path)
            .field("autocommit", &self.conn.is_autocommit())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_and_query_round_trip() {
        let mut conn = SqliteConnection::open(&SqliteOptions::in_memory()).unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER, note TEXT);")
            .unwrap();
        let affected = conn
            .execute(
                "INSERT INTO t (id, note) VALUES (?1, ?2)",
                &[RowValues::Int(1), RowValues::Null],
            )
            .unwrap();
        assert_eq!(affected, 1);

        let rs = conn.query("SELECT id, note FROM t", &[]).unwrap();
        assert_eq!(rs.column_names().as_slice(), ["id", "note"]);
        assert_eq!(rs.results[0].get("note"), Some(&RowValues::Null));
    }

    #[test]
    fn begin_leaves_autocommit() {
        let mut conn = SqliteConnection::open(&SqliteOptions::in_memory()).unwrap();
        conn.begin().unwrap();
        assert!(!conn.raw().is_autocommit());
        conn.rollback().unwrap();
        assert!(conn.raw().is_autocommit());
    }

    #[test]
    fn adopted_connection_keeps_its_label() {
        let raw = Connection::open_in_memory().unwrap();
        let mut conn = SqliteConnection::from_connection(raw, "adopted");
        assert_eq!(conn.db_path(), "adopted");
        conn.execute_batch("CREATE TABLE t (id INTEGER);").unwrap();
        Box::new(conn).close().unwrap();
    }

    #[test]
    fn missing_directory_is_a_connection_error() {
        let opts = SqliteOptions::new("/nonexistent-dir/for/sql-txn/test.db");
        let err = SqliteConnection::open(&opts).unwrap_err();
        assert!(matches!(err, SqlTxnError::ConnectionError(_)));
    }
}
