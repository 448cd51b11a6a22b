use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ContactPayload, ConversationSummary};

/// One outbound CRM integration. Implementations isolate
/// their own failures — a failing adapter never blocks a sibling's sync or
/// the conversation's reply path.
#[async_trait]
pub trait CrmAdapter: Send + Sync {
    /// Display name used in logs, e.g. "EspoCRM", "HubSpot".
    fn platform_name(&self) -> &'static str;

    /// Create or update a lead/contact from a name plus email and/or phone.
    async fn sync_lead(&self, name: &str, email: Option<&str>, phone: Option<&str>) -> Result<()>;

    /// Sync a contact record surfaced directly by a channel (e.g. Chatwoot's
    /// `contact_created`/`contact_updated`).
    async fn sync_contact(&self, contact: &ContactPayload) -> Result<()>;

    /// Attach the conversation summary to the matching lead/contact as a
    /// note. A no-op (logged, not an error) when no matching record exists.
    async fn update_lead_summary(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        summary: &ConversationSummary,
    ) -> Result<()>;
}
