//! `SQLite` driver backed by rusqlite.

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use connection::SqliteConnection;
pub use params::Params;
pub use query::{build_result_set, sqlite_extract_value_sync};
