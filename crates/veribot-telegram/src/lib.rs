//! Telegram Bot API channel adapter: webhook-driven, not the
//! long-polling `Dispatcher` shape a personal-assistant bot would use — each
//! update arrives as `POST /webhook/telegram/{bot_token}` and each reply is
//! one `sendMessage` call.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;
use veribot_channels::{Attachment, Channel, ChannelAdapter, ChannelError, EventKind, InboundEvent, OutboundMessage, Result};

pub struct TelegramAdapter {
    client: reqwest::Client,
    api_base: String,
}

impl TelegramAdapter {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new(), api_base: "https://api.telegram.org".to_string() }
    }
}

impl Default for TelegramAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn channel_name(&self) -> &'static str {
        "telegram"
    }

    fn normalize(&self, bot_token: &str, raw_body: &[u8]) -> Result<Option<InboundEvent>> {
        let update: Update = serde_json::from_slice(raw_body).map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;
        let Some(message) = update.message else {
            return Ok(None);
        };

        Ok(Some(InboundEvent {
            channel: Channel::Telegram,
            tenant_key: bot_token.to_string(),
            external_id: message.chat.id.to_string(),
            from_us: false,
            kind: EventKind::Text,
            text: message.text,
            attachments: Vec::<Attachment>::new(),
            sender: None,
            conversation_status: None,
        }))
    }

    async fn send_reply(&self, event: &InboundEvent, message: &OutboundMessage) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, event.tenant_key);
        let body = serde_json::json!({
            "chat_id": event.external_id,
            "text": message.text,
            "parse_mode": "Markdown",
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "telegram sendMessage failed");
            return Err(ChannelError::SendFailed { status: status.as_u16(), message: text });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Update {
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_updates_without_message() {
        let body = br#"{"update_id": 1}"#;
        assert!(TelegramAdapter::new().normalize("tok", body).unwrap().is_none());
    }

    #[test]
    fn extracts_chat_id_and_text() {
        let body = br#"{"update_id": 1, "message": {"chat": {"id": 42}, "text": "hi bot"}}"#;
        let event = TelegramAdapter::new().normalize("tok", body).unwrap().unwrap();
        assert_eq!(event.external_id, "42");
        assert_eq!(event.text.as_deref(), Some("hi bot"));
    }
}
