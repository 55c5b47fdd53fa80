//! Error types for the explorer.

use std::path::PathBuf;

use chaingraph_explorer_net::NetworkError;

/// Result type alias for explorer operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Errors returned by the explorer controller and catalog lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExplorerError {
    /// An index outside the catalog was selected.
    #[error("Example index {index} is out of range (catalog has {len} examples)")]
    OutOfRange { index: usize, len: usize },
}

impl ExplorerError {
    /// Create an out-of-range error.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::OutOfRange { index, len }
    }
}

/// Errors raised while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The catalog has no examples.
    #[error("Catalog must contain at least one example")]
    Empty,

    /// Two examples share a name.
    #[error("Duplicate example name '{0}'")]
    DuplicateName(String),

    /// An example has blank GraphQL source.
    #[error("Example '{0}' has no GraphQL source")]
    EmptySource(String),

    /// An example's mock result is not valid JSON.
    #[error("Mock result of example '{name}' is not valid JSON: {message}")]
    InvalidMock { name: String, message: String },

    /// The catalog document could not be parsed.
    #[error("Catalog parse error: {0}")]
    Parse(String),
}

impl CatalogError {
    /// Create an invalid-mock error.
    pub fn invalid_mock(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMock {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while loading or applying an [`ExplorerConfig`](crate::ExplorerConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid TOML for this schema.
    #[error("Config parse error: {0}")]
    Parse(String),

    /// A setting has an unusable value.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The GraphQL client could not be built from the configuration.
    #[error("Failed to build GraphQL client: {0}")]
    Client(#[from] NetworkError),
}

impl ConfigError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a value error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
