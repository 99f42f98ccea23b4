//! Error types for the refresher.

use std::path::PathBuf;

use tally_db::DbError;
use thiserror::Error;

/// Refresher failures. Per-table problems are logged and counted in the
/// report instead; these abort a pass or startup.
#[derive(Debug, Error)]
pub enum RefresherError {
    /// Config file could not be read or written.
    #[error("Config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`RefresherConfig`](crate::config::RefresherConfig).
    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be serialized.
    #[error("Could not serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// A setting is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Database failure outside a single table.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for refresher operations.
pub type RefresherResult<T> = Result<T, RefresherError>;
