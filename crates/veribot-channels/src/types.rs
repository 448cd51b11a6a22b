use serde::{Deserialize, Serialize};

/// The inbound surface a webhook arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Evolution,
    Telegram,
    Chatwoot,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Evolution => "evolution",
            Channel::Telegram => "telegram",
            Channel::Chatwoot => "chatwoot",
        }
    }
}

/// What an `InboundEvent` represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Text,
    Audio,
    StatusChange,
    Contact,
    Created,
}

/// One piece of binary content attached to an inbound event (an audio note,
/// an image) — channel adapters resolve the actual bytes via their own
/// media-download API before handing this to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub mime: String,
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
}

/// Contact details a channel surfaced alongside an event (e.g. Chatwoot's
/// `contact_created`/`contact_updated`), used for CRM contact sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SenderInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A webhook payload normalized into the neutral shape the orchestrator
/// consumes, regardless of which channel it arrived on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub channel: Channel,
    /// Identifies the tenant's binding on this channel (Evolution `instance`,
    /// Telegram `bot_token`, Chatwoot `tenant_slug`).
    pub tenant_key: String,
    /// The remote conversation's stable id on the source channel (WhatsApp
    /// JID, Telegram chat id, Chatwoot conversation id).
    pub external_id: String,
    /// True when the event was emitted by the bot/tenant's own account —
    /// always dropped by the orchestrator to prevent reply loops.
    pub from_us: bool,
    pub kind: EventKind,
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub sender: Option<SenderInfo>,
    /// Chatwoot-specific: the conversation's current status, used to gate
    /// `message_created` routing and detect `resolved` transitions.
    pub conversation_status: Option<String>,
}

/// A reply the orchestrator hands back to the channel adapter for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
}
