use serde::{Deserialize, Serialize};
use veribot_core::{TenantConfig, TenantId};

/// Full tenant record. Loaded from SQLite, cached in memory while warm.
///
/// `channel_key` is the external identity the gateway uses to find this
/// tenant before it even knows the `TenantId` — a WhatsApp instance name,
/// a Telegram bot token, or a Chatwoot inbox id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub channel_key: String,
    pub name: String,
    /// Ordered language preferences, most-preferred first.
    pub preferred_languages: Vec<String>,
    pub quota_limit: Option<u64>,
    pub usage_count: u64,
    pub config: TenantConfig,
    pub created_at: String,
}

impl Tenant {
    pub fn primary_language(&self) -> &str {
        self.preferred_languages
            .first()
            .map(|s| s.as_str())
            .unwrap_or("en")
    }

    pub fn has_quota(&self) -> bool {
        match self.quota_limit {
            Some(limit) => self.usage_count < limit,
            None => true,
        }
    }
}
