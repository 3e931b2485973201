use thiserror::Error;

/// Why a sheet could not be turned into records.
///
/// The display strings are shown to staff on the orders page as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Spreadsheet '{0}' not found. Please check the name and sharing settings.")]
    DocumentNotFound(String),

    #[error("Worksheet '{0}' not found. Please check the worksheet name.")]
    SheetNotFound(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Unexpected(err.to_string())
    }
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        SourceError::Unexpected(err.to_string())
    }
}

#[cfg(feature = "web")]
impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Unexpected(err.to_string())
    }
}

/// Startup configuration problems. The server refuses to start on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("SESSION_SECRET must be at least {min} bytes, got {actual}")]
    SecretTooShort { min: usize, actual: usize },

    #[error("invalid BIND_ADDR '{0}'")]
    InvalidBindAddr(String),

    #[error("DASHBOARD_PASSWORD_HASH is not a valid PHC string: {0}")]
    InvalidPasswordHash(String),

    #[error("failed to hash DASHBOARD_PASSWORD: {0}")]
    Hashing(String),

    #[error("template error: {0}")]
    Template(String),
}
