use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single turn in a chat-style request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Tool definition offered to the model during a `chat` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A tool invocation the model asked for. Multiple may be returned in one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// Result of a `chat` call: either free text, one or more tool calls, or both
/// (a model may emit reasoning text alongside a tool_use block).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResult {
    pub text: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResult {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// The logical step an LLM call is being made on behalf of. Used to resolve `{step -> {provider, model}}` from `LlmConfig` and as a
/// cache key alongside the model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Hyde,
    Rerank,
    Contextualize,
    Generation,
    SmallTalk,
    Transcription,
    ImageDescription,
    Summarization,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Hyde => "hyde",
            Step::Rerank => "rerank",
            Step::Contextualize => "contextualize",
            Step::Generation => "generation",
            Step::SmallTalk => "small_talk",
            Step::Transcription => "transcription",
            Step::ImageDescription => "image_description",
            Step::Summarization => "summarization",
        }
    }
}

/// Text-completion/chat/multimodal capability exposed by one provider.
/// A single provider instance may not implement every
/// method meaningfully — e.g. an OpenAI-compatible provider answers
/// `transcribe_audio` but a pure-text provider returns `Unsupported`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;

    async fn chat(
        &self,
        model: &str,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResult, ProviderError>;

    async fn describe_image(&self, model: &str, bytes: &[u8], mime: &str) -> Result<String, ProviderError> {
        let _ = (model, bytes, mime);
        Err(ProviderError::Unsupported("describe_image"))
    }

    async fn transcribe_audio(&self, model: &str, bytes: &[u8], mime: &str) -> Result<String, ProviderError> {
        let _ = (model, bytes, mime);
        Err(ProviderError::Unsupported("transcribe_audio"))
    }
}

/// Batch text embedding capability. `D` is fixed per
/// deployment; a mismatched dimension on return is a fatal configuration
/// error the caller surfaces rather than silently truncating/padding.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;
    fn dimension(&self) -> usize;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("request timed out")]
    Timeout,

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("unsupported capability: {0}")]
    Unsupported(&'static str),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}
