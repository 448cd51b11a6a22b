use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::provider::{
    ChatMessage, ChatResult, EmbeddingProvider, LlmProvider, ProviderError, Role, ToolCall, ToolDefinition,
};

/// Adapter for any OpenAI-compatible chat/embeddings/transcription endpoint:
/// bearer auth, `/v1/chat/completions` for chat, `/v1/audio/transcriptions`
/// (multipart upload) for the transcription path.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    provider_name: String,
    embedding_dim: usize,
}

impl OpenAiCompatProvider {
    pub fn new(name: impl Into<String>, api_key: String, base_url: String, embedding_dim: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider_name: name.into(),
            api_key,
            base_url,
            embedding_dim,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let result = self.chat(model, "", &[ChatMessage::user(prompt)], &[]).await?;
        Ok(result.text)
    }

    async fn chat(
        &self,
        model: &str,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResult, ProviderError> {
        let mut api_messages = Vec::new();
        if !system.is_empty() {
            api_messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        for m in messages {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => "system",
            };
            api_messages.push(serde_json::json!({ "role": role, "content": m.content }));
        }

        let mut body = serde_json::json!({
            "model": model,
            "messages": api_messages,
        });
        if !tools.is_empty() {
            body["tools"] = serde_json::json!(tools
                .iter()
                .map(|t| serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.input_schema,
                    },
                }))
                .collect::<Vec<_>>());
        }

        debug!(model, provider = %self.provider_name, "sending OpenAI-compatible chat request");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            return Err(ProviderError::RateLimited { retry_after_ms: 5000 });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "OpenAI-compatible API error");
            return Err(ProviderError::Api { status, message: text });
        }

        let parsed: ChatCompletionResponse =
            resp.json().await.map_err(|e| ProviderError::Parse(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Parse("empty choices array".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                input: serde_json::from_str(&tc.function.arguments).unwrap_or(serde_json::Value::Null),
            })
            .collect();

        Ok(ChatResult {
            text: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    async fn transcribe_audio(&self, model: &str, bytes: &[u8], mime: &str) -> Result<String, ProviderError> {
        let filename = match mime {
            "audio/ogg" => "audio.ogg",
            "audio/wav" => "audio.wav",
            _ => "audio.mp3",
        };
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(filename)
            .mime_str(mime)
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("model", model.to_string())
            .part("file", part);

        let url = format!("{}/v1/audio/transcriptions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "transcription API error");
            return Err(ProviderError::Api { status, message: text });
        }

        #[derive(Deserialize)]
        struct TranscriptionResponse {
            text: String,
        }
        let parsed: TranscriptionResponse =
            resp.json().await.map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(parsed.text)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn dimension(&self) -> usize {
        self.embedding_dim
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vecs = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        vecs.pop().ok_or_else(|| ProviderError::Parse("empty embedding response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": "text-embedding-3-small",
            "input": texts,
        });
        let resp = self.client.post(&url).bearer_auth(&self.api_key).json(&body).send().await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, message: text });
        }

        #[derive(Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingData>,
        }
        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }
        let parsed: EmbeddingResponse = resp.json().await.map_err(|e| ProviderError::Parse(e.to_string()))?;

        for v in &parsed.data {
            if v.embedding.len() != self.embedding_dim {
                return Err(ProviderError::DimensionMismatch {
                    expected: self.embedding_dim,
                    got: v.embedding.len(),
                });
            }
        }
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}
