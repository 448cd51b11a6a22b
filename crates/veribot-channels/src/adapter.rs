use async_trait::async_trait;

use crate::error::Result;
use crate::types::{InboundEvent, OutboundMessage};

/// A stateless webhook-driven channel: normalize an inbound payload, send an
/// outbound reply. Unlike a persistent-connection bot framework there is no
/// connect/disconnect/reconnect lifecycle here — each webhook delivery and
/// each reply is one independent HTTP round trip.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    fn channel_name(&self) -> &'static str;

    /// Parse a raw webhook body into the neutral event shape. Returns `Ok(None)`
    /// for payloads that are valid but uninteresting (e.g. a Chatwoot event
    /// type the orchestrator doesn't act on) rather than an error, so callers
    /// can 2xx-and-ignore rather than retry a webhook delivery that will
    /// never become interesting on a second attempt.
    fn normalize(&self, tenant_key: &str, raw_body: &[u8]) -> Result<Option<InboundEvent>>;

    /// Deliver a reply to the conversation the given inbound event came from.
    async fn send_reply(&self, event: &InboundEvent, message: &OutboundMessage) -> Result<()>;
}
