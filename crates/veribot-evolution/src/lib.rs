//! Evolution (WhatsApp-gateway) channel adapter: `messages.upsert` event
//! filtering, `fromMe` loop prevention, `conversation`/`extendedTextMessage`
//! text extraction, and the `sendText` outbound shape.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use veribot_channels::{Attachment, Channel, ChannelAdapter, ChannelError, EventKind, InboundEvent, OutboundMessage, Result};

pub struct EvolutionAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EvolutionAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), api_key: api_key.into() }
    }
}

#[async_trait]
impl ChannelAdapter for EvolutionAdapter {
    fn channel_name(&self) -> &'static str {
        "evolution"
    }

    fn normalize(&self, instance: &str, raw_body: &[u8]) -> Result<Option<InboundEvent>> {
        let payload: WebhookPayload =
            serde_json::from_slice(raw_body).map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;

        if payload.event.as_deref() != Some("messages.upsert") {
            return Ok(None);
        }
        let data = payload.data.unwrap_or_default();
        let key = data.key.unwrap_or_default();
        let from_us = key.from_me.unwrap_or(false);

        let Some(remote_jid) = key.remote_jid else {
            return Err(ChannelError::InvalidPayload("missing data.key.remoteJid".to_string()));
        };
        let external_id = remote_jid.split('@').next().unwrap_or(&remote_jid).to_string();

        let message = data.message.unwrap_or_default();
        let text = message
            .conversation
            .or_else(|| message.extended_text_message.and_then(|m| m.text));

        if text.is_none() && !from_us {
            debug!(instance, "evolution event had no extractable text, ignoring");
            return Ok(None);
        }

        Ok(Some(InboundEvent {
            channel: Channel::Evolution,
            tenant_key: instance.to_string(),
            external_id,
            from_us,
            kind: EventKind::Text,
            text,
            attachments: Vec::<Attachment>::new(),
            sender: None,
            conversation_status: None,
        }))
    }

    async fn send_reply(&self, event: &InboundEvent, message: &OutboundMessage) -> Result<()> {
        let url = format!("{}/message/sendText/{}", self.base_url, event.tenant_key);
        let body = serde_json::json!({
            "number": event.external_id,
            "text": message.text,
            "options": { "delay": 1200, "presence": "composing" },
        });

        let resp = self.client.post(&url).header("apikey", &self.api_key).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "evolution sendText failed");
            return Err(ChannelError::SendFailed { status: status.as_u16(), message: text });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    event: Option<String>,
    data: Option<EventData>,
}

#[derive(Debug, Default, Deserialize)]
struct EventData {
    key: Option<MessageKey>,
    message: Option<MessageContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageKey {
    from_me: Option<bool>,
    remote_jid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageContent {
    conversation: Option<String>,
    #[serde(rename = "extendedTextMessage")]
    extended_text_message: Option<ExtendedTextMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtendedTextMessage {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> EvolutionAdapter {
        EvolutionAdapter::new("https://evo.example.com", "secret")
    }

    #[test]
    fn ignores_non_upsert_events() {
        let body = br#"{"event": "connection.update", "data": {}}"#;
        assert!(adapter().normalize("inst1", body).unwrap().is_none());
    }

    #[test]
    fn drops_own_messages_but_keeps_from_us_flag() {
        let body = br#"{
            "event": "messages.upsert",
            "data": { "key": { "fromMe": true, "remoteJid": "5511999@s.whatsapp.net" },
                      "message": { "conversation": "hi" } }
        }"#;
        let event = adapter().normalize("inst1", body).unwrap().unwrap();
        assert!(event.from_us);
    }

    #[test]
    fn extracts_conversation_text_and_phone() {
        let body = br#"{
            "event": "messages.upsert",
            "data": { "key": { "fromMe": false, "remoteJid": "5511999888777@s.whatsapp.net" },
                      "message": { "conversation": "Hello there" } }
        }"#;
        let event = adapter().normalize("inst1", body).unwrap().unwrap();
        assert_eq!(event.external_id, "5511999888777");
        assert_eq!(event.text.as_deref(), Some("Hello there"));
        assert!(!event.from_us);
    }

    #[test]
    fn falls_back_to_extended_text_message() {
        let body = br#"{
            "event": "messages.upsert",
            "data": { "key": { "fromMe": false, "remoteJid": "123@s.whatsapp.net" },
                      "message": { "extendedTextMessage": { "text": "formatted hi" } } }
        }"#;
        let event = adapter().normalize("inst1", body).unwrap().unwrap();
        assert_eq!(event.text.as_deref(), Some("formatted hi"));
    }
}
