//! Chatwoot channel adapter: `message_created` only routes to the
//! orchestrator when `message_type == incoming` and the conversation is
//! `pending`/unset; `open`/`snoozed` conversations are left alone (a human
//! is already handling them).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;
use veribot_channels::{
    Attachment, Channel, ChannelAdapter, ChannelError, EventKind, InboundEvent, OutboundMessage, Result, SenderInfo,
};

pub struct ChatwootAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    account_id: u64,
}

impl ChatwootAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, account_id: u64) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), api_key: api_key.into(), account_id }
    }

    /// Move a conversation between the bot-owned and human-owned states
    /// (`pending` while the bot answers, `open` once `requires_human` fires)
    /// or mark it `resolved` after summarization.
    pub async fn toggle_status(&self, conversation_id: &str, status: &str) -> Result<()> {
        let url = format!(
            "{}/api/v1/accounts/{}/conversations/{}/toggle_status",
            self.base_url, self.account_id, conversation_id
        );
        let resp = self
            .client
            .post(&url)
            .header("api_access_token", &self.api_key)
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let status_code = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status_code, body = %text, "chatwoot toggle_status failed");
            return Err(ChannelError::SendFailed { status: status_code, message: text });
        }
        Ok(())
    }

    /// Mirror a discovered email/phone back onto the Chatwoot contact.
    /// Chatwoot returns 422 when the email is already claimed by another
    /// contact; that's logged and swallowed rather than surfaced as a
    /// channel-adapter failure — CRM-adjacent sync failures are isolated and
    /// never block the reply path.
    pub async fn update_contact(&self, contact_id: &str, email: Option<&str>, phone: Option<&str>) {
        if email.is_none() && phone.is_none() {
            return;
        }
        let url = format!("{}/api/v1/accounts/{}/contacts/{}", self.base_url, self.account_id, contact_id);
        let mut payload = serde_json::Map::new();
        if let Some(email) = email {
            payload.insert("email".to_string(), serde_json::json!(email));
        }
        if let Some(phone) = phone {
            payload.insert("phone_number".to_string(), serde_json::json!(phone));
        }
        match self
            .client
            .put(&url)
            .header("api_access_token", &self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) if !resp.status().is_success() => {
                let status = resp.status().as_u16();
                let text = resp.text().await.unwrap_or_default();
                warn!(status, body = %text, "chatwoot contact update failed");
            }
            Err(e) => warn!(error = %e, "chatwoot contact update request failed"),
            _ => {}
        }
    }
}

#[async_trait]
impl ChannelAdapter for ChatwootAdapter {
    fn channel_name(&self) -> &'static str {
        "chatwoot"
    }

    fn normalize(&self, tenant_slug: &str, raw_body: &[u8]) -> Result<Option<InboundEvent>> {
        let payload: WebhookPayload =
            serde_json::from_slice(raw_body).map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;

        let sender = payload.sender.map(|s| SenderInfo { name: s.name, email: s.email, phone: s.phone_number });

        match payload.event.as_deref() {
            Some("message_created") => {
                if payload.message_type.as_deref() != Some("incoming") {
                    return Ok(None);
                }
                let status = payload.conversation.as_ref().and_then(|c| c.status.clone());
                if matches!(status.as_deref(), Some("open") | Some("snoozed")) {
                    return Ok(None);
                }
                let Some(conversation_id) = payload.conversation.as_ref().map(|c| c.id) else {
                    return Err(ChannelError::InvalidPayload("missing conversation.id".to_string()));
                };
                Ok(Some(InboundEvent {
                    channel: Channel::Chatwoot,
                    tenant_key: tenant_slug.to_string(),
                    external_id: conversation_id.to_string(),
                    from_us: false,
                    kind: EventKind::Text,
                    text: payload.content,
                    attachments: Vec::<Attachment>::new(),
                    sender,
                    conversation_status: status,
                }))
            }
            Some("conversation_created") => {
                let conversation_id =
                    payload.conversation.as_ref().map(|c| c.id.to_string()).unwrap_or_default();
                Ok(Some(InboundEvent {
                    channel: Channel::Chatwoot,
                    tenant_key: tenant_slug.to_string(),
                    external_id: conversation_id,
                    from_us: false,
                    kind: EventKind::Created,
                    text: None,
                    attachments: Vec::new(),
                    sender,
                    conversation_status: None,
                }))
            }
            Some("contact_created") | Some("contact_updated") => Ok(Some(InboundEvent {
                channel: Channel::Chatwoot,
                tenant_key: tenant_slug.to_string(),
                external_id: payload.id.map(|id| id.to_string()).unwrap_or_default(),
                from_us: false,
                kind: EventKind::Contact,
                text: None,
                attachments: Vec::new(),
                sender,
                conversation_status: None,
            })),
            Some("conversation_status_changed") => {
                let status = payload.status.or_else(|| payload.conversation.as_ref().and_then(|c| c.status.clone()));
                let conversation_id =
                    payload.conversation.as_ref().map(|c| c.id.to_string()).unwrap_or_default();
                Ok(Some(InboundEvent {
                    channel: Channel::Chatwoot,
                    tenant_key: tenant_slug.to_string(),
                    external_id: conversation_id,
                    from_us: false,
                    kind: EventKind::StatusChange,
                    text: None,
                    attachments: Vec::new(),
                    sender,
                    conversation_status: status,
                }))
            }
            _ => Ok(None),
        }
    }

    async fn send_reply(&self, event: &InboundEvent, message: &OutboundMessage) -> Result<()> {
        let url = format!(
            "{}/api/v1/accounts/{}/conversations/{}/messages",
            self.base_url, self.account_id, event.external_id
        );
        let body = serde_json::json!({ "content": message.text, "message_type": "outgoing", "private": false });

        let resp = self.client.post(&url).header("api_access_token", &self.api_key).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "chatwoot send message failed");
            return Err(ChannelError::SendFailed { status: status.as_u16(), message: text });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    event: Option<String>,
    message_type: Option<String>,
    content: Option<String>,
    status: Option<String>,
    id: Option<u64>,
    conversation: Option<ConversationInfo>,
    sender: Option<SenderPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationInfo {
    id: u64,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SenderPayload {
    name: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> ChatwootAdapter {
        ChatwootAdapter::new("https://chat.example.com", "token", 1)
    }

    #[test]
    fn ignores_outgoing_messages() {
        let body = br#"{"event": "message_created", "message_type": "outgoing", "content": "hi"}"#;
        assert!(adapter().normalize("acme", body).unwrap().is_none());
    }

    #[test]
    fn ignores_open_conversations() {
        let body = br#"{
            "event": "message_created", "message_type": "incoming", "content": "hi",
            "conversation": {"id": 5, "status": "open"}
        }"#;
        assert!(adapter().normalize("acme", body).unwrap().is_none());
    }

    #[test]
    fn routes_pending_incoming_messages() {
        let body = br#"{
            "event": "message_created", "message_type": "incoming", "content": "help me",
            "conversation": {"id": 5, "status": "pending"}
        }"#;
        let event = adapter().normalize("acme", body).unwrap().unwrap();
        assert_eq!(event.external_id, "5");
        assert_eq!(event.text.as_deref(), Some("help me"));
    }

    #[test]
    fn detects_resolved_status_change() {
        let body = br#"{
            "event": "conversation_status_changed", "status": "resolved",
            "conversation": {"id": 9, "status": "resolved"}
        }"#;
        let event = adapter().normalize("acme", body).unwrap().unwrap();
        assert_eq!(event.kind, EventKind::StatusChange);
        assert_eq!(event.conversation_status.as_deref(), Some("resolved"));
    }
}
