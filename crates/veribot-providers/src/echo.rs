use async_trait::async_trait;

use crate::provider::{ChatMessage, ChatResult, EmbeddingProvider, LlmProvider, ProviderError, ToolDefinition};

/// Deterministic provider used in tests and local development when no live
/// LLM/embedding credentials are configured. The real providers all require
/// network access unavailable to tests, so this is shaped as the simplest
/// possible conforming implementation — every deployment still needs one
/// default provider registered, and this is it when nothing else is.
pub struct EchoProvider {
    dimension: usize,
}

impl EchoProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, _model: &str, prompt: &str) -> Result<String, ProviderError> {
        Ok(format!("[echo] {prompt}"))
    }

    async fn chat(
        &self,
        _model: &str,
        _system: &str,
        messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ChatResult, ProviderError> {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        Ok(ChatResult { text: format!("[echo] {last}"), tool_calls: Vec::new() })
    }

    async fn describe_image(&self, _model: &str, bytes: &[u8], _mime: &str) -> Result<String, ProviderError> {
        Ok(format!("[echo image description, {} bytes]", bytes.len()))
    }

    async fn transcribe_audio(&self, _model: &str, bytes: &[u8], _mime: &str) -> Result<String, ProviderError> {
        Ok(format!("[echo transcript, {} bytes]", bytes.len()))
    }
}

#[async_trait]
impl EmbeddingProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(deterministic_vector(text, self.dimension))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|t| deterministic_vector(t, self.dimension)).collect())
    }
}

/// A small hash-derived embedding: stable across calls, varies with the
/// input text, good enough to exercise cosine-similarity ranking in tests
/// without a real embedding model.
fn deterministic_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut state: u64 = 1469598103934665603;
    for byte in text.bytes() {
        state ^= byte as u64;
        state = state.wrapping_mul(1099511628211);
    }
    (0..dim)
        .map(|i| {
            state = state.wrapping_add(i as u64).wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embed_query_is_deterministic() {
        let provider = EchoProvider::new(8);
        let a = provider.embed_query("hello").await.unwrap();
        let b = provider.embed_query("hello").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[tokio::test]
    async fn different_text_yields_different_vector() {
        let provider = EchoProvider::new(8);
        let a = provider.embed_query("hello").await.unwrap();
        let b = provider.embed_query("goodbye").await.unwrap();
        assert_ne!(a, b);
    }
}
