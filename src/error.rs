use thiserror::Error;

use crate::context::ContextId;

#[derive(Debug, Error)]
pub enum SqlTxnError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("No active connection bound to context {0}")]
    NoActiveConnection(ContextId),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Transaction state error: {0}")]
    TransactionStateError(String),

    #[error("Other database error: {0}")]
    Other(String),
}

/// Coarse classification of a [`SqlTxnError`], independent of the driver that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The driver could not establish or acquire a connection.
    Connection,
    /// `current()` was asked for a context with nothing bound.
    NoActiveConnection,
    /// The driver rejected or failed a statement.
    SqlExecution,
    /// A transaction operation was issued in a state that cannot accept it.
    TransactionState,
    /// The data source description was invalid.
    Config,
    /// A parameter could not be converted for the driver.
    Parameter,
    Other,
}

impl SqlTxnError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(feature = "sqlite")]
            SqlTxnError::SqliteError(_) => ErrorKind::SqlExecution,
            SqlTxnError::ConfigError(_) => ErrorKind::Config,
            SqlTxnError::ConnectionError(_) => ErrorKind::Connection,
            SqlTxnError::NoActiveConnection(_) => ErrorKind::NoActiveConnection,
            SqlTxnError::ParameterError(_) => ErrorKind::Parameter,
            SqlTxnError::ExecutionError(_) => ErrorKind::SqlExecution,
            SqlTxnError::TransactionStateError(_) => ErrorKind::TransactionState,
            SqlTxnError::Other(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(
            SqlTxnError::ConnectionError("refused".into()).kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            SqlTxnError::NoActiveConnection(ContextId::from(7)).kind(),
            ErrorKind::NoActiveConnection
        );
        assert_eq!(
            SqlTxnError::ExecutionError("syntax".into()).kind(),
            ErrorKind::SqlExecution
        );
    }

    #[test]
    fn no_active_connection_names_the_context() {
        let err = SqlTxnError::NoActiveConnection(ContextId::from(42));
        assert_eq!(
            err.to_string(),
            "No active connection bound to context ctx-42"
        );
    }
}
