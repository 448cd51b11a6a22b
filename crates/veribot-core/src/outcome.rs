use serde::Serialize;

/// Terminal disposition of one inbound-event pipeline run. Distinct from
/// `CoreError`: these are expected, loggable outcomes, not failures. The
/// gateway returns 200 to the webhook source for every variant except
/// `ConfigMissing`, which is fatal for that message and maps to a 5xx so the
/// source retries delivery instead of the message being silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// No tenant matched the channel key carried by the webhook.
    UnknownTenant,
    /// Conversation is paused by a magic word; event recorded but not routed
    /// to the agent.
    Paused,
    /// Event type is not one the orchestrator acts on (e.g. reactions,
    /// read receipts, `fromMe` echoes).
    IgnoredEvent,
    /// Event carried no usable text or transcribable audio.
    EmptyMessage,
    /// Tenant has exhausted its message quota for the current period.
    QuotaExceeded,
    /// Event ran the full pipeline and produced a reply.
    Processed,
    /// Tenant exists but is missing configuration required by this channel.
    ConfigMissing,
    /// Webhook body failed to parse into a known event shape.
    InvalidPayload,
}

impl PipelineOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineOutcome::UnknownTenant => "unknown_tenant",
            PipelineOutcome::Paused => "paused",
            PipelineOutcome::IgnoredEvent => "ignored_event",
            PipelineOutcome::EmptyMessage => "empty_message",
            PipelineOutcome::QuotaExceeded => "quota_exceeded",
            PipelineOutcome::Processed => "processed",
            PipelineOutcome::ConfigMissing => "config_missing",
            PipelineOutcome::InvalidPayload => "invalid_payload",
        }
    }
}
