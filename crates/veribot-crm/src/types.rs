use serde::{Deserialize, Serialize};

/// Structured lead-qualification output of the summarization step, parsed
/// from the LLM's JSON reply to `SUMMARY_PROMPT_TEMPLATE`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(default)]
    pub purchase_intent: String,
    #[serde(default)]
    pub urgency_level: String,
    #[serde(default)]
    pub sentiment_score: String,
    #[serde(default)]
    pub detected_budget: Option<String>,
    #[serde(default)]
    pub ai_summary: String,
    #[serde(default)]
    pub contact_info: ContactInfo,
    #[serde(default)]
    pub client_description: String,
    /// Stamped on from the first message's `created_at` as `DD/MM/YYYY
    /// HH:MM`, not part of the model's JSON output.
    #[serde(default)]
    pub conversation_start: Option<String>,
    /// Stamped on from the last message's `created_at` as `DD/MM/YYYY
    /// HH:MM`, not part of the model's JSON output.
    #[serde(default)]
    pub conversation_end: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

/// A contact record as surfaced by a channel adapter (Chatwoot
/// `contact_created`/`contact_updated`), fanned out to CRM adapters'
/// `sync_contact`.
#[derive(Debug, Clone, Default)]
pub struct ContactPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}
