pub mod anthropic;
pub mod echo;
pub mod openai_compat;
pub mod prompts;
pub mod provider;
pub mod registry;

pub use anthropic::AnthropicProvider;
pub use echo::EchoProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{
    ChatMessage, ChatResult, EmbeddingProvider, LlmProvider, ProviderError, Role, Step, ToolCall, ToolDefinition,
};
pub use registry::ProviderRegistry;
