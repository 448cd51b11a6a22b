use thiserror::Error;

/// Errors that can occur during conversation-binding operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("binding not found: {key}")]
    NotFound { key: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The provided binding key string is malformed.
    ///
    /// Expected format: `tenant:{tenant_id}:external:{external_id}`
    #[error("invalid binding key: {0}")]
    InvalidKey(String),

    #[error("tenant quota exceeded: used {used}, limit {limit}")]
    QuotaExceeded { used: u64, limit: u64 },

    #[error("tenant registry error: {0}")]
    Tenant(#[from] veribot_tenants::TenantError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
