use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use veribot_core::LlmConfig;
use veribot_memory::ChatMemory;
use veribot_providers::{ProviderRegistry, Step};
use veribot_rag::prompts::{self, SUMMARY_PROMPT_TEMPLATE};

use crate::adapter::CrmAdapter;
use crate::types::ConversationSummary;

/// How many chat turns are rendered into the summarization prompt. Unlike
/// the answer-generation steps, a summary needs the whole conversation, not
/// just a recent window.
const MAX_HISTORY_MESSAGES: usize = 200;

/// Per-call bound on outbound CRM requests; a slow or hung CRM endpoint
/// never holds up the rest of the fan-out.
pub const CRM_TIMEOUT: Duration = Duration::from_secs(10);

/// Summarizes a finished conversation and fans the result out to every
/// configured CRM adapter, isolating failures per adapter.
pub struct SummarizerAndSync {
    chat_memory: Arc<ChatMemory>,
    providers: Arc<ProviderRegistry>,
    llm_config: Option<LlmConfig>,
}

impl SummarizerAndSync {
    pub fn new(chat_memory: Arc<ChatMemory>, providers: Arc<ProviderRegistry>, llm_config: Option<LlmConfig>) -> Self {
        Self { chat_memory, providers, llm_config }
    }

    /// Fetch a session's full history and produce a `ConversationSummary`.
    /// Falls back to a neutral summary (never an error) on empty history, a
    /// missing provider, or malformed model output — a CRM sync with a
    /// degraded summary is still better than none.
    pub async fn summarize(&self, session_id: &str) -> ConversationSummary {
        let history = match self.chat_memory.all(session_id) {
            Ok(h) => h,
            Err(e) => {
                error!(error = %e, session_id, "failed to load history for summarization");
                return ConversationSummary {
                    purchase_intent: "None".to_string(),
                    urgency_level: "Low".to_string(),
                    sentiment_score: "Neutral".to_string(),
                    ai_summary: format!("Error: {e}"),
                    ..Default::default()
                };
            }
        };

        if history.is_empty() {
            warn!(session_id, "no history found for session");
            return ConversationSummary {
                purchase_intent: "None".to_string(),
                urgency_level: "Low".to_string(),
                sentiment_score: "Neutral".to_string(),
                ai_summary: "No history available.".to_string(),
                ..Default::default()
            };
        }

        let conversation_start = history.first().and_then(|m| format_conversation_timestamp(&m.created_at));
        let conversation_end = history.last().and_then(|m| format_conversation_timestamp(&m.created_at));
        let history_str = history
            .iter()
            .take(MAX_HISTORY_MESSAGES)
            .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let Some((provider, model)) = self.providers.resolve(self.llm_config.as_ref(), Step::Summarization) else {
            error!("no provider configured for summarization");
            return ConversationSummary {
                purchase_intent: "None".to_string(),
                urgency_level: "Low".to_string(),
                sentiment_score: "Neutral".to_string(),
                ai_summary: "Error: no provider configured for summarization".to_string(),
                ..Default::default()
            };
        };

        let prompt = prompts::fill(SUMMARY_PROMPT_TEMPLATE, &[("history_str", &history_str)]);
        let raw = match provider.complete(&model, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "summarization LLM call failed");
                return ConversationSummary {
                    purchase_intent: "None".to_string(),
                    urgency_level: "Low".to_string(),
                    sentiment_score: "Neutral".to_string(),
                    ai_summary: format!("Error: {e}"),
                    ..Default::default()
                };
            }
        };

        let mut summary = parse_summary(&raw);
        summary.conversation_start = conversation_start;
        summary.conversation_end = conversation_end;
        summary
    }

    /// Fan a summary out to every configured CRM adapter, logging and
    /// swallowing per-adapter failures — CRM sync never blocks or fails the
    /// caller.
    pub async fn sync_summary(
        &self,
        crms: &[Arc<dyn CrmAdapter>],
        email: Option<&str>,
        phone: Option<&str>,
        summary: &ConversationSummary,
    ) {
        if crms.is_empty() {
            info!("skipping CRM summary sync: no CRM configured");
            return;
        }
        for crm in crms {
            match tokio::time::timeout(CRM_TIMEOUT, crm.update_lead_summary(email, phone, summary)).await {
                Ok(Ok(())) => info!(platform = crm.platform_name(), "summary synced"),
                Ok(Err(e)) => error!(platform = crm.platform_name(), error = %e, "CRM summary sync failed"),
                Err(_) => error!(platform = crm.platform_name(), "CRM summary sync timed out"),
            }
        }
    }

    /// Fan a lead/contact sync out to every configured CRM adapter.
    pub async fn sync_lead(&self, crms: &[Arc<dyn CrmAdapter>], name: &str, email: Option<&str>, phone: Option<&str>) {
        if crms.is_empty() {
            info!("skipping CRM lead sync: no CRM configured");
            return;
        }
        for crm in crms {
            match tokio::time::timeout(CRM_TIMEOUT, crm.sync_lead(name, email, phone)).await {
                Ok(Ok(())) => info!(platform = crm.platform_name(), "lead synced"),
                Ok(Err(e)) => error!(platform = crm.platform_name(), error = %e, "CRM lead sync failed"),
                Err(_) => error!(platform = crm.platform_name(), "CRM lead sync timed out"),
            }
        }
    }
}

/// Render a stored RFC3339 `created_at` as the `DD/MM/YYYY HH:MM` format the
/// CRM-facing summary JSON uses. Malformed input is dropped rather than
/// propagated — a missing timestamp is preferable to a sync failure.
fn format_conversation_timestamp(created_at: &str) -> Option<String> {
    chrono::DateTime::parse_from_rfc3339(created_at).ok().map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
}

/// Parse the model's JSON reply, stripping code fences the way rerank/hyde
/// parsing does; malformed JSON degrades to a neutral summary rather than
/// failing the whole sync.
fn parse_summary(raw: &str) -> ConversationSummary {
    let trimmed = raw.trim().trim_start_matches("```json").trim_start_matches("```").trim_end_matches("```").trim();
    serde_json::from_str(trimmed).unwrap_or_else(|_| {
        warn!(raw, "malformed summary JSON");
        ConversationSummary {
            purchase_intent: "None".to_string(),
            urgency_level: "Low".to_string(),
            sentiment_score: "Neutral".to_string(),
            ai_summary: "Summarization failed (JSON error).".to_string(),
            ..Default::default()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_summary_handles_fenced_json() {
        let raw = "```json\n{\"purchase_intent\": \"High\", \"urgency_level\": \"Urgent\", \
                   \"sentiment_score\": \"Positive\", \"ai_summary\": \"Wants a demo\", \
                   \"client_description\": \"Eager buyer\"}\n```";
        let summary = parse_summary(raw);
        assert_eq!(summary.purchase_intent, "High");
        assert_eq!(summary.sentiment_score, "Positive");
    }

    #[test]
    fn parse_summary_defaults_on_garbage() {
        let summary = parse_summary("not json");
        assert_eq!(summary.purchase_intent, "None");
        assert_eq!(summary.ai_summary, "Summarization failed (JSON error).");
    }

    #[test]
    fn format_conversation_timestamp_renders_dd_mm_yyyy() {
        let formatted = format_conversation_timestamp("2026-03-05T14:30:00+00:00").unwrap();
        assert_eq!(formatted, "05/03/2026 14:30");
    }

    #[test]
    fn format_conversation_timestamp_none_on_garbage() {
        assert_eq!(format_conversation_timestamp("not a timestamp"), None);
    }
}
