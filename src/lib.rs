//! Per-connection database access: nested transactions over a single driver
//! connection, row mapping, and backtick-dialect quoting of identifiers and
//! literals.

pub mod connection;
pub mod context;
pub mod datasource;
pub mod driver;
pub mod encoding;
pub mod error;
pub mod mapper;
pub mod prelude;
pub mod quoting;
pub mod results;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod types;

pub use connection::{TransactionalConnection, TxState};
pub use context::{ConnectionRegistry, ContextId};
pub use datasource::{DataSource, DataSourceConfig};
pub use driver::{ConnectionFactory, RawConnection};
pub use encoding::SqlLiteral;
pub use error::{ErrorKind, SqlTxnError};
pub use results::{ResultSet, Row};
pub use types::{DriverKind, RowValues};
