use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};
use veribot_channels::ChannelAdapter;
use veribot_chatwoot::ChatwootAdapter;
use veribot_core::PipelineOutcome;
use veribot_evolution::EvolutionAdapter;
use veribot_telegram::TelegramAdapter;

use crate::{app::AppState, auth::verify_hmac_sha256, orchestrator};

/// POST /webhook/evolution
///
/// Evolution carries its tenant key (`instance`) as a top-level field of the
/// JSON body itself rather than in the URL, so unlike Telegram/Chatwoot below
/// there's no routing parameter to pull it from — it has to be read out of
/// the body before a tenant, and therefore an authenticated adapter, can be
/// resolved. `EvolutionAdapter::normalize` doesn't touch the adapter's own
/// credentials, so a throwaway instance with no base_url/api_key is enough to
/// parse the payload; the real per-tenant adapter (used for the reply) is
/// resolved later, inside the orchestrator, once the tenant is known.
pub async fn evolution_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    if let Some(secret) = &state.config.webhooks.evolution_hmac_secret {
        if let Err(reason) = verify_hmac_sha256(header_str(&headers, "x-hub-signature-256"), &body, secret) {
            warn!(reason, "evolution webhook auth failed");
            return (StatusCode::OK, Json(json!({ "outcome": PipelineOutcome::InvalidPayload.as_str() })));
        }
    }

    let instance = extract_top_level_field(&body, "instance").unwrap_or_default();
    let parser = EvolutionAdapter::new(String::new(), String::new());
    handle_parsed(&state, parser.normalize(&instance, &body), "evolution").await
}

/// POST /webhook/telegram/{bot_token}
///
/// The bot token doubles as both routing key and credential — Telegram has no
/// separate signature scheme, so there's nothing to verify beyond the token
/// itself matching a configured tenant (done by `TenantRegistry::resolve`
/// inside the orchestrator).
pub async fn telegram_webhook(
    State(state): State<Arc<AppState>>,
    Path(bot_token): Path<String>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let parser = TelegramAdapter::new();
    handle_parsed(&state, parser.normalize(&bot_token, &body), "telegram").await
}

/// POST /webhook/chatwoot/{tenant_slug}
pub async fn chatwoot_webhook(
    State(state): State<Arc<AppState>>,
    Path(tenant_slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    if let Some(secret) = &state.config.webhooks.chatwoot_hmac_secret {
        if let Err(reason) = verify_hmac_sha256(header_str(&headers, "x-hub-signature-256"), &body, secret) {
            warn!(reason, "chatwoot webhook auth failed");
            return (StatusCode::OK, Json(json!({ "outcome": PipelineOutcome::InvalidPayload.as_str() })));
        }
    }

    let parser = ChatwootAdapter::new(String::new(), String::new(), 0);
    handle_parsed(&state, parser.normalize(&tenant_slug, &body), "chatwoot").await
}

/// Shared tail of all three handlers: turn a `normalize()` result into a
/// `PipelineOutcome` response. Webhook sources retry on non-2xx, so most
/// dispositions return 200 — the outcome is communicated in the body, not
/// the status code — except `ConfigMissing`, which is fatal for that message
/// (the tenant exists but lacks configuration this channel needs) and maps
/// to 503 so the source retries delivery instead of the message being
/// silently dropped.
async fn handle_parsed(
    state: &AppState,
    parsed: veribot_channels::Result<Option<veribot_channels::InboundEvent>>,
    source: &str,
) -> (StatusCode, Json<Value>) {
    let outcome = match parsed {
        Ok(Some(event)) => orchestrator::handle_inbound_event(state, event).await,
        Ok(None) => PipelineOutcome::IgnoredEvent,
        Err(e) => {
            warn!(source, error = %e, "failed to parse webhook payload");
            PipelineOutcome::InvalidPayload
        }
    };
    info!(source, outcome = outcome.as_str(), "webhook processed");
    let status = match outcome {
        PipelineOutcome::ConfigMissing => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (status, Json(json!({ "outcome": outcome.as_str() })))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn extract_top_level_field(body: &[u8], field: &str) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get(field)?.as_str().map(|s| s.to_string())
}
