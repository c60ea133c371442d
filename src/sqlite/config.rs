use std::time::Duration;

use crate::error::SqlTxnError;

pub(crate) const MEMORY_PATH: &str = ":memory:";

/// Options for opening a `SQLite` connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    pub db_path: String,
    pub busy_timeout: Option<Duration>,
    pub foreign_keys: bool,
    pub journal_wal: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: Some(Duration::from_secs(5)),
            foreign_keys: true,
            journal_wal: false,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    /// Derive options from a connection URL.
    ///
    /// Accepts `:memory:`, `sqlite::memory:`, `sqlite:<path>`, `sqlite://<path>`,
    /// or a bare filesystem path.
    ///
    /// # Errors
    /// Returns `SqlTxnError::ConfigError` for an empty URL or path.
    pub fn from_url(url: &str) -> Result<Self, SqlTxnError> {
        let rest = url.trim();
        let rest = rest
            .strip_prefix("sqlite://")
            .or_else(|| rest.strip_prefix("sqlite:"))
            .unwrap_or(rest);
        if rest.is_empty() {
            return Err(SqlTxnError::ConfigError(format!(
                "SQLite URL has no database path: {url:?}"
            )));
        }
        Ok(Self::new(rest))
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.db_path == MEMORY_PATH
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn journal_wal(mut self, enabled: bool) -> Self {
        self.opts.journal_wal = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }
}

impl SqliteOptions {
    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_forms() {
        assert!(SqliteOptions::from_url(":memory:").unwrap().is_memory());
        assert!(SqliteOptions::from_url("sqlite::memory:").unwrap().is_memory());
        assert_eq!(
            SqliteOptions::from_url("sqlite:///tmp/app.db").unwrap().db_path,
            "/tmp/app.db"
        );
        assert_eq!(
            SqliteOptions::from_url("sqlite:data/app.db").unwrap().db_path,
            "data/app.db"
        );
        assert_eq!(SqliteOptions::from_url("app.db").unwrap().db_path, "app.db");
    }

    #[test]
    fn empty_url_is_rejected() {
        assert!(matches!(
            SqliteOptions::from_url("sqlite://"),
            Err(SqlTxnError::ConfigError(_))
        ));
    }

    #[test]
    fn builder_overrides_defaults() {
        let opts = SqliteOptions::builder("x.db")
            .busy_timeout(None)
            .foreign_keys(false)
            .journal_wal(true)
            .finish();
        assert_eq!(opts.busy_timeout, None);
        assert!(!opts.foreign_keys);
        assert!(opts.journal_wal);
    }
}
