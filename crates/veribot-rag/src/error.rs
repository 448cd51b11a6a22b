use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("memory error: {0}")]
    Memory(#[from] veribot_memory::MemoryError),

    #[error("provider error: {0}")]
    Provider(#[from] veribot_providers::ProviderError),

    #[error("no provider configured for step {0}")]
    NoProvider(&'static str),

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, RagError>;
