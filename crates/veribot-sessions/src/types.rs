use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Structured key identifying a conversation binding.
///
/// VeriBot conversations are channel-centric, not user-centric: the same
/// tenant talking through two different WhatsApp numbers gets two separate
/// bindings. Format: `tenant:{tenant_id}:external:{external_id}`, where
/// `external_id` is the channel-native conversation identifier (a WhatsApp
/// `remoteJid`, a Telegram `chat_id`, a Chatwoot `conversation_id`) and may
/// itself contain colons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingKey {
    pub tenant_id: String,
    pub external_id: String,
}

impl BindingKey {
    pub fn new(tenant_id: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            external_id: external_id.into(),
        }
    }

    pub fn format(&self) -> String {
        format!("tenant:{}:external:{}", self.tenant_id, self.external_id)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix("tenant:")
            .ok_or_else(|| SessionError::InvalidKey(format!("missing 'tenant:' prefix: {s}")))?;

        let marker = ":external:";
        let pos = rest
            .find(marker)
            .ok_or_else(|| SessionError::InvalidKey(format!("missing ':external:' segment: {s}")))?;

        let tenant_id = &rest[..pos];
        let external_id = &rest[pos + marker.len()..];

        if tenant_id.is_empty() || external_id.is_empty() {
            return Err(SessionError::InvalidKey(format!(
                "key components must not be empty: {s}"
            )));
        }

        Ok(Self {
            tenant_id: tenant_id.to_string(),
            external_id: external_id.to_string(),
        })
    }
}

impl std::fmt::Display for BindingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

/// A persisted conversation binding: the link between an external channel
/// conversation and the RAG-side chat session that holds its memory, plus
/// the pause flag a magic word toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationBinding {
    pub tenant_id: String,
    pub external_id: String,
    pub chat_session_id: Option<String>,
    pub paused: bool,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_simple_key() {
        let key = BindingKey::new("t-1", "5511999999999");
        let s = key.format();
        assert_eq!(s, "tenant:t-1:external:5511999999999");
        let parsed = BindingKey::parse(&s).expect("parse failed");
        assert_eq!(parsed, key);
    }

    #[test]
    fn roundtrip_external_id_with_colons() {
        let key = BindingKey::new("t-2", "5511999999999@s.whatsapp.net:device1");
        let s = key.format();
        let parsed = BindingKey::parse(&s).expect("parse failed");
        assert_eq!(parsed.external_id, "5511999999999@s.whatsapp.net:device1");
    }

    #[test]
    fn parse_missing_external_returns_err() {
        assert!(BindingKey::parse("tenant:t-1:5511").is_err());
    }

    #[test]
    fn parse_missing_tenant_prefix_returns_err() {
        assert!(BindingKey::parse("external:5511").is_err());
    }
}
