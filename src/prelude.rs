//! Convenient imports for common functionality.

pub use crate::connection::{TransactionalConnection, TxState};
pub use crate::context::{ConnectionRegistry, ContextId};
pub use crate::datasource::{DataSource, DataSourceConfig};
pub use crate::driver::{ConnectionFactory, RawConnection};
pub use crate::encoding::{SqlLiteral, quote, quote_list};
pub use crate::error::{ErrorKind, SqlTxnError};
pub use crate::quoting::{
    ColumnRef, IdentRef, TableRef, quote_column, quote_columns, quote_table, quote_tables,
};
pub use crate::results::{ResultSet, Row};
pub use crate::types::{DriverKind, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteOptions};
