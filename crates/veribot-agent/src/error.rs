use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("provider error: {0}")]
    Provider(#[from] veribot_providers::ProviderError),

    #[error("rag error: {0}")]
    Rag(#[from] veribot_rag::RagError),

    #[error("no provider configured for step {0}")]
    NoProvider(&'static str),

    #[error("agent loop exceeded {0} iterations without a final response")]
    MaxIterations(usize),
}

pub type Result<T> = std::result::Result<T, AgentError>;
