use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::provider::{ChatMessage, ChatResult, LlmProvider, ProviderError, Role, ToolCall, ToolDefinition};

const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API adapter, trimmed to the capability surface
/// `LlmProvider` needs here (no streaming, no OAuth token exchange —
/// tenants supply a plain API key).
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.anthropic.com".to_string()),
        }
    }

    async fn send(&self, body: serde_json::Value) -> Result<ApiResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            let retry = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5000);
            return Err(ProviderError::RateLimited { retry_after_ms: retry });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "Anthropic API error");
            return Err(ProviderError::Api { status, message: text });
        }
        resp.json().await.map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let result = self
            .chat(model, "", &[ChatMessage::user(prompt)], &[])
            .await?;
        Ok(result.text)
    }

    async fn chat(
        &self,
        model: &str,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResult, ProviderError> {
        let api_messages: Vec<_> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": match m.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                        Role::System => "user",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": model,
            "max_tokens": 1024,
            "messages": api_messages,
        });
        if !system.is_empty() {
            body["system"] = serde_json::json!(system);
        }
        if !tools.is_empty() {
            body["tools"] = serde_json::json!(tools
                .iter()
                .map(|t| serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.input_schema,
                }))
                .collect::<Vec<_>>());
        }

        debug!(model, "sending Anthropic chat request");
        let api_resp = self.send(body).await?;
        Ok(parse_response(api_resp))
    }

    async fn describe_image(&self, model: &str, bytes: &[u8], mime: &str) -> Result<String, ProviderError> {
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        let body = serde_json::json!({
            "model": model,
            "max_tokens": 1024,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": { "type": "base64", "media_type": mime, "data": b64 },
                    },
                    {
                        "type": "text",
                        "text": crate::prompts::IMAGE_DESCRIPTION_PROMPT,
                    },
                ],
            }],
        });
        let api_resp = self.send(body).await?;
        Ok(parse_response(api_resp).text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: serde_json::Value },
    #[serde(other)]
    Other,
}

fn parse_response(resp: ApiResponse) -> ChatResult {
    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for block in resp.content {
        match block {
            ContentBlock::Text { text: t } => text.push_str(&t),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall { id, name, input }),
            ContentBlock::Other => {}
        }
    }
    ChatResult { text, tool_calls }
}
