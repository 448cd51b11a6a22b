use thiserror::Error;

/// Shared error type for cross-cutting failures that don't belong to one
/// specific subsystem crate. Each subsystem (tenants, sessions, providers,
/// rag, crm) defines its own error enum and converts into this one only at
/// the orchestrator boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short error code, used the way skynet's `SkynetError::code()` feeds
    /// its wire-protocol error frames — here it feeds structured log fields
    /// and the orchestrator's outcome mapping.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::Database(_) => "DATABASE_ERROR",
            CoreError::Serialization(_) => "SERIALIZATION_ERROR",
            CoreError::Io(_) => "IO_ERROR",
            CoreError::Timeout { .. } => "TIMEOUT",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
