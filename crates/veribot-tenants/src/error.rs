use thiserror::Error;

/// All tenant-layer errors. Kept separate from `CoreError` so the gateway
/// can map them to pipeline outcomes without coupling layers.
#[derive(Debug, Error)]
pub enum TenantError {
    #[error("Tenant not found: {0}")]
    NotFound(String),

    #[error("Tenant already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Invalid tenant config: {0}")]
    InvalidConfig(String),

    /// Raised when the tenant's message quota is exhausted. Caller maps this
    /// to `PipelineOutcome::QuotaExceeded` rather than surfacing a 500.
    #[error("Quota exceeded: used {used}, limit {limit}")]
    QuotaExceeded { used: u64, limit: u64 },
}

pub type Result<T> = std::result::Result<T, TenantError>;
