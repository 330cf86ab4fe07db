//! Error types for the color controller.

/// Errors surfaced by controller operations.
///
/// Screenshot encode failures never appear here; the capture worker logs
/// and drops them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required cooperating module is not loaded in the host process.
    #[error("required module is not loaded: {module}")]
    MissingDependency {
        /// Module file name that was probed.
        module: &'static str,
    },

    /// An incompatible predecessor module is loaded in the host process.
    #[error("incompatible module is loaded: {module}")]
    ConflictingModule {
        /// Module file name that was found.
        module: &'static str,
    },

    /// The OS display-configuration query or update failed.
    #[error("display query failed: {0}")]
    DisplayQuery(String),

    /// The render backend rejected a request.
    #[error("render backend error: {0}")]
    Backend(String),

    /// A setting id or value was not accepted.
    #[error("settings error: {0}")]
    Settings(String),

    /// An I/O error occurred while reading or writing the settings store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings store file could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
