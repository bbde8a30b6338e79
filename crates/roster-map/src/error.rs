//! Error types for mapping operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from building matchers and loading or storing mapping tables.
///
/// A token without a rule is never an error; see [`crate::CodeMatcher::resolve`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MappingError {
    /// A pattern key that does not compile. Reported when the matcher is built.
    #[error("invalid pattern key '{key}': {message}")]
    InvalidPattern { key: String, message: String },

    /// Station identifier that cannot name a mapping directory.
    #[error("invalid station code '{0}'")]
    InvalidStation(String),

    /// Requested mapping version does not exist.
    #[error("mapping version '{version}' not found for station {station}")]
    VersionNotFound { station: String, version: String },

    /// Import file had no usable rows.
    #[error("no mapping rows found in {}", path.display())]
    EmptyImport { path: PathBuf },

    /// Stored mapping document has an unexpected shape.
    #[error("malformed mapping file {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl MappingError {
    /// True when the error means the mapping table itself must be fixed.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPattern { .. } | Self::Malformed { .. } | Self::EmptyImport { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MappingError>;
