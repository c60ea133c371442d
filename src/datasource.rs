use std::env;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::driver::{ConnectionFactory, RawConnection, SharedFactory};
use crate::error::SqlTxnError;
use crate::types::DriverKind;

/// Where connections come from: a URL for a known driver, or a factory.
#[derive(Clone)]
pub enum DataSource {
    Url(DataSourceConfig),
    Factory(SharedFactory),
}

/// Connection URL, driver identifier, and optional credentials.
///
/// ```rust
/// use sql_txn::prelude::*;
///
/// let cfg = DataSourceConfig::from_json_str(r#"{"url": ":memory:", "driver": "sqlite"}"#)?;
/// assert_eq!(cfg.driver, DriverKind::Sqlite);
/// # Ok::<(), SqlTxnError>(())
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DataSourceConfig {
    pub url: String,
    pub driver: DriverKind,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl DataSourceConfig {
    #[must_use]
    pub fn new(url: impl Into<String>, driver: DriverKind) -> Self {
        Self {
            url: url.into(),
            driver,
            user: None,
            password: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Parse a JSON document with `url`, `driver`, and optional `user`/`password`.
    ///
    /// # Errors
    /// Returns `SqlTxnError::ConfigError` if the JSON is malformed or names an unknown driver.
    pub fn from_json_str(json: &str) -> Result<Self, SqlTxnError> {
        serde_json::from_str(json)
            .map_err(|e| SqlTxnError::ConfigError(format!("invalid data source JSON: {e}")))
    }

    /// Read `{prefix}_URL`, `{prefix}_DRIVER`, `{prefix}_USER`, and `{prefix}_PASSWORD`.
    ///
    /// # Errors
    /// Returns `SqlTxnError::ConfigError` if the URL or driver variable is missing or invalid.
    pub fn from_env(prefix: &str) -> Result<Self, SqlTxnError> {
        let required = |name: &str| {
            let key = format!("{prefix}_{name}");
            env::var(&key).map_err(|_| SqlTxnError::ConfigError(format!("{key} is not set")))
        };
        let optional = |name: &str| env::var(format!("{prefix}_{name}")).ok();

        Ok(Self {
            url: required("URL")?,
            driver: DriverKind::parse(&required("DRIVER")?)?,
            user: optional("USER"),
            password: optional("PASSWORD"),
        })
    }

    /// Open a raw connection with the configured driver.
    ///
    /// # Errors
    /// Returns `SqlTxnError::ConfigError` for an unusable URL and
    /// `SqlTxnError::ConnectionError` if the driver cannot connect.
    pub fn open(&self) -> Result<Box<dyn RawConnection>, SqlTxnError> {
        match self.driver {
            #[cfg(feature = "sqlite")]
            DriverKind::Sqlite => {
                use crate::sqlite::{SqliteConnection, SqliteOptions};

                if self.user.is_some() {
                    tracing::debug!("sqlite ignores data source credentials");
                }
                let opts = SqliteOptions::from_url(&self.url)?;
                Ok(Box::new(SqliteConnection::open(&opts)?))
            }
        }
    }
}

impl fmt::Debug for DataSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceConfig")
            .field("url", &self.url)
            .field("driver", &self.driver)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl DataSource {
    /// Data source for a URL and driver with no credentials.
    #[must_use]
    pub fn url(url: impl Into<String>, driver: DriverKind) -> Self {
        DataSource::Url(DataSourceConfig::new(url, driver))
    }

    /// Data source backed by a connection factory.
    pub fn factory<F>(factory: F) -> Self
    where
        F: ConnectionFactory + 'static,
    {
        DataSource::Factory(Arc::new(factory))
    }

    /// Acquire a new raw connection.
    ///
    /// # Errors
    /// Propagates the configuration or connection failure from the driver or factory.
    pub fn open(&self) -> Result<Box<dyn RawConnection>, SqlTxnError> {
        match self {
            DataSource::Url(cfg) => cfg.open(),
            DataSource::Factory(factory) => factory.open(),
        }
    }
}

impl From<DataSourceConfig> for DataSource {
    fn from(cfg: DataSourceConfig) -> Self {
        DataSource::Url(cfg)
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(cfg) => f.debug_tuple("Url").field(cfg).finish(),
            DataSource::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}
