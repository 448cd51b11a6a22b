use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use veribot_agent::{AgentRuntime, LookupPricingTool, SearchKnowledgeBaseTool};
use veribot_channels::{Channel, EventKind, InboundEvent, OutboundMessage};
use veribot_core::PipelineOutcome;
use veribot_crm::{ContactPayload, ConversationSummary, SummarizerAndSync};
use veribot_memory::ChatRole;
use veribot_providers::{ChatMessage as ProviderMessage, Role as ProviderRole, Step};
use veribot_tenants::Tenant;

use crate::app::AppState;

/// Generic assistant persona shared by every tenant. Per-tenant customization
/// (`ClientConfig.custom_instructions`) is injected as an extra message
/// rather than folded into this string, since `AgentRuntimeCache` keys its
/// cached runtimes by `(provider, model)` only — varying the system prompt
/// per tenant would defeat that cache or leak one tenant's instructions into
/// another's cached runtime.
const SYSTEM_PROMPT: &str = "You are VeriBot, a multi-tenant customer support assistant. \
Answer the user's question using the search_knowledge_base tool whenever it might be answered \
by the tenant's documents. Use lookup_pricing for pricing questions. If you cannot help, or the \
user explicitly asks for a human, call transfer_to_human and let them know a person will follow up. \
Keep answers concise and written for the channel they arrived on (chat, not email).";

const PAUSE_WORDS: [&str; 5] = ["#stop", "#human", "#humano", "#parar", "#pause"];
const RESUME_WORDS: [&str; 5] = ["#bot", "#start", "#iniciar", "#resume", "#auto"];

const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);
const TRANSCRIPTION_TIMEOUT: Duration = Duration::from_secs(60);
const SUMMARIZATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Run one inbound webhook event through the full pipeline. Never returns an
/// `Err` — every failure mode degrades to a `PipelineOutcome` variant so the
/// HTTP layer can map it to a response without inspecting internals.
pub async fn handle_inbound_event(state: &AppState, event: InboundEvent) -> PipelineOutcome {
    if event.from_us {
        return PipelineOutcome::IgnoredEvent;
    }

    let tenant = match state.tenants.resolve(&event.tenant_key) {
        Ok(Some(t)) => t,
        Ok(None) => return PipelineOutcome::UnknownTenant,
        Err(e) => {
            warn!(error = %e, tenant_key = %event.tenant_key, "tenant resolution failed");
            return PipelineOutcome::ConfigMissing;
        }
    };

    match event.kind {
        EventKind::Created => {
            handle_conversation_created(state, &tenant, &event).await;
            return PipelineOutcome::Processed;
        }
        EventKind::Contact => {
            handle_contact_event(state, &tenant, &event).await;
            return PipelineOutcome::Processed;
        }
        EventKind::StatusChange => {
            if event.conversation_status.as_deref() == Some("resolved") {
                handle_conversation_resolved(state, &tenant, &event).await;
                return PipelineOutcome::Processed;
            }
            return PipelineOutcome::IgnoredEvent;
        }
        EventKind::Text | EventKind::Audio => {}
    }

    let lock = state.binding_locks.lock_for(tenant.id.as_str(), &event.external_id);
    let _guard = lock.lock().await;

    if let Some(text) = &event.text {
        let normalized = text.trim().to_lowercase();
        if PAUSE_WORDS.contains(&normalized.as_str()) {
            return set_paused_and_reply(state, &tenant, &event, true).await;
        }
        if RESUME_WORDS.contains(&normalized.as_str()) {
            return set_paused_and_reply(state, &tenant, &event, false).await;
        }
    }

    let binding = match state.sessions.get_or_create(tenant.id.as_str(), &event.external_id) {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "binding lookup failed");
            return PipelineOutcome::ConfigMissing;
        }
    };
    if binding.paused {
        return PipelineOutcome::Paused;
    }

    if let Err(e) = state.quota.admit(&tenant) {
        info!(tenant = %tenant.id, error = %e, "quota exceeded, dropping message");
        return PipelineOutcome::QuotaExceeded;
    }

    let text = match resolve_text(state, &tenant, &event).await {
        Some(t) => t,
        None => return PipelineOutcome::EmptyMessage,
    };

    let session_id = match binding.chat_session_id {
        Some(id) => id,
        None => match state.chat_memory.create_session(tenant.id.as_str()) {
            Ok(id) => {
                let id = id.to_string();
                if let Err(e) = state.sessions.link_chat_session(tenant.id.as_str(), &event.external_id, &id) {
                    warn!(error = %e, "failed to link new chat session to binding");
                }
                id
            }
            Err(e) => {
                warn!(error = %e, "failed to create chat session");
                return PipelineOutcome::ConfigMissing;
            }
        },
    };

    run_agent_and_reply(state, &tenant, &event, &session_id, &text).await
}

/// Fetch inline text, or transcribe the first attachment when the event
/// carried audio and no text. `None` signals "nothing usable" → `EmptyMessage`.
async fn resolve_text(state: &AppState, tenant: &Tenant, event: &InboundEvent) -> Option<String> {
    if let Some(text) = &event.text {
        if !text.trim().is_empty() {
            return Some(text.clone());
        }
    }
    if event.kind != EventKind::Audio {
        return None;
    }
    let attachment = event.attachments.first()?;
    let (provider, model) = state.providers.resolve(tenant.config.llm_config.as_ref(), Step::Transcription)?;

    match tokio::time::timeout(TRANSCRIPTION_TIMEOUT, provider.transcribe_audio(&model, &attachment.bytes, &attachment.mime)).await {
        Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
        Ok(Ok(_)) => {
            info!("transcription returned empty text");
            None
        }
        Ok(Err(e)) => {
            warn!(error = %e, "transcription failed");
            None
        }
        Err(_) => {
            warn!("transcription timed out");
            None
        }
    }
}

async fn run_agent_and_reply(
    state: &AppState,
    tenant: &Tenant,
    event: &InboundEvent,
    session_id: &str,
    text: &str,
) -> PipelineOutcome {
    let Some((provider, model)) = state.providers.resolve(tenant.config.llm_config.as_ref(), Step::Generation) else {
        warn!(tenant = %tenant.id, "no generation provider configured");
        return PipelineOutcome::ConfigMissing;
    };
    let runtime = state.agent_cache.get_or_create(provider, &model, SYSTEM_PROMPT);

    let rag = Arc::new(state.rag_engine(tenant));
    let rag_cfg = tenant.config.rag.as_ref();
    let use_hyde = rag_cfg.and_then(|c| c.use_hyde).unwrap_or(false);
    let use_rerank = rag_cfg.and_then(|c| c.use_rerank).unwrap_or(false);
    let google_sheets_url = rag_cfg.and_then(|c| c.google_sheets_url.clone());

    let requires_human = Arc::new(AtomicBool::new(false));
    // session_id is deliberately omitted here: RagEngine::query appends its
    // own (sub-query, answer) pair to ChatMemory when given one, which would
    // interleave tool-internal retrieval turns into the conversation log the
    // orchestrator already persists explicitly below.
    let search_tool = Box::new(SearchKnowledgeBaseTool::new(
        rag,
        tenant.id.as_str(),
        None,
        use_hyde,
        use_rerank,
        tenant.preferred_languages.clone(),
    ));
    let pricing_tool = Box::new(LookupPricingTool::new(state.http_client.clone(), google_sheets_url));
    let tools = AgentRuntime::build_tools(requires_human.clone(), search_tool, pricing_tool);

    let mut messages = match state.chat_memory.recent(session_id, 20) {
        Ok(history) => history_to_messages(history),
        Err(e) => {
            warn!(error = %e, "failed to load chat history, continuing with empty context");
            Vec::new()
        }
    };

    if let Some(instructions) = tenant.config.client_config.as_ref().and_then(|c| c.custom_instructions.clone()) {
        if !instructions.trim().is_empty() {
            messages.push(ProviderMessage::user(format!(
                "(Tenant-specific instructions for this conversation — follow these in addition to your default behavior: {instructions})"
            )));
        }
    }
    messages.push(ProviderMessage::user(text.to_string()));

    let run_result = match tokio::time::timeout(GENERATION_TIMEOUT, runtime.run(&tools, &mut messages, &requires_human)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(error = %e, tenant = %tenant.id, "agent run failed");
            return fallback_reply(state, tenant, event, "agent_failure").await;
        }
        Err(_) => {
            warn!(tenant = %tenant.id, "agent run timed out");
            return fallback_reply(state, tenant, event, "timeout").await;
        }
    };

    if let Err(e) = state.chat_memory.append(session_id, ChatRole::User, text) {
        warn!(error = %e, "failed to persist user turn");
    }
    if let Err(e) = state.chat_memory.append(session_id, ChatRole::Assistant, &run_result.final_text) {
        warn!(error = %e, "failed to persist assistant turn");
    }

    deliver_reply(state, tenant, event, &run_result.final_text, run_result.requires_human).await;
    PipelineOutcome::Processed
}

async fn set_paused_and_reply(state: &AppState, tenant: &Tenant, event: &InboundEvent, paused: bool) -> PipelineOutcome {
    if let Err(e) = state.sessions.get_or_create(tenant.id.as_str(), &event.external_id) {
        warn!(error = %e, "failed to create binding for magic-word command");
        return PipelineOutcome::ConfigMissing;
    }
    if let Err(e) = state.sessions.set_paused(tenant.id.as_str(), &event.external_id, paused) {
        warn!(error = %e, "failed to update paused state");
        return PipelineOutcome::ConfigMissing;
    }

    let confirmation = if paused {
        "Conversation paused — a human will take it from here. Send #bot to resume automated replies."
    } else {
        "Automated replies resumed."
    };
    deliver_reply(state, tenant, event, confirmation, paused).await;
    PipelineOutcome::Processed
}

async fn fallback_reply(state: &AppState, tenant: &Tenant, event: &InboundEvent, reason: &str) -> PipelineOutcome {
    warn!(reason, tenant = %tenant.id, "falling back to human handoff reply");
    deliver_reply(
        state,
        tenant,
        event,
        "We're having a temporary issue on our end — connecting you with a team member.",
        true,
    )
    .await;
    PipelineOutcome::Processed
}

async fn deliver_reply(state: &AppState, tenant: &Tenant, event: &InboundEvent, text: &str, requires_human: bool) {
    let Some(adapter) = state.channel_adapter(event.channel, tenant) else {
        warn!(channel = event.channel.as_str(), tenant = %tenant.id, "no channel adapter configured, dropping reply");
        return;
    };
    let message = OutboundMessage { text: text.to_string() };
    if let Err(e) = adapter.send_reply(event, &message).await {
        warn!(error = %e, channel = event.channel.as_str(), "failed to deliver reply");
    }

    if event.channel == Channel::Chatwoot {
        if let Some(chatwoot) = state.chatwoot_adapter(tenant) {
            let status = if requires_human { "open" } else { "pending" };
            if let Err(e) = chatwoot.toggle_status(&event.external_id, status).await {
                warn!(error = %e, "failed to toggle chatwoot conversation status");
            }
        }
    }
}

async fn handle_conversation_created(state: &AppState, tenant: &Tenant, event: &InboundEvent) {
    let crms = state.crm_adapters(tenant);
    if crms.is_empty() {
        return;
    }
    let Some(sender) = &event.sender else {
        return;
    };
    let name = sender.name.clone().unwrap_or_default();
    let summarizer = SummarizerAndSync::new(state.chat_memory.clone(), state.providers.clone(), tenant.config.llm_config.clone());
    summarizer.sync_lead(&crms, &name, sender.email.as_deref(), sender.phone.as_deref()).await;
}

async fn handle_contact_event(state: &AppState, tenant: &Tenant, event: &InboundEvent) {
    let crms = state.crm_adapters(tenant);
    if crms.is_empty() {
        return;
    }
    let Some(sender) = &event.sender else {
        return;
    };
    let payload = ContactPayload { name: sender.name.clone(), email: sender.email.clone(), phone: sender.phone.clone() };
    for crm in &crms {
        match tokio::time::timeout(veribot_crm::summarizer::CRM_TIMEOUT, crm.sync_contact(&payload)).await {
            Ok(Ok(())) => info!(platform = crm.platform_name(), "contact synced"),
            Ok(Err(e)) => warn!(platform = crm.platform_name(), error = %e, "contact sync failed"),
            Err(_) => warn!(platform = crm.platform_name(), "contact sync timed out"),
        }
    }
}

async fn handle_conversation_resolved(state: &AppState, tenant: &Tenant, event: &InboundEvent) {
    let binding = match state.sessions.get(tenant.id.as_str(), &event.external_id) {
        Ok(Some(b)) => b,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "failed to fetch binding on conversation-resolved event");
            return;
        }
    };
    let Some(session_id) = binding.chat_session_id else {
        return;
    };

    let summarizer = SummarizerAndSync::new(state.chat_memory.clone(), state.providers.clone(), tenant.config.llm_config.clone());
    let summary = match tokio::time::timeout(SUMMARIZATION_TIMEOUT, summarizer.summarize(&session_id)).await {
        Ok(summary) => summary,
        Err(_) => {
            warn!(session_id, "summarization timed out");
            timed_out_summary()
        }
    };

    let crms = state.crm_adapters(tenant);
    let email = event.sender.as_ref().and_then(|s| s.email.as_deref());
    let phone = event.sender.as_ref().and_then(|s| s.phone.as_deref());
    summarizer.sync_summary(&crms, email, phone, &summary).await;

    if let Err(e) = state.chat_memory.delete_session(&session_id) {
        warn!(error = %e, "failed to purge chat memory on conversation resolve");
    }
    if let Err(e) = state.sessions.unlink_chat_session(tenant.id.as_str(), &event.external_id) {
        warn!(error = %e, "failed to unlink binding on conversation resolve");
    }
}

fn timed_out_summary() -> ConversationSummary {
    ConversationSummary {
        purchase_intent: "None".to_string(),
        urgency_level: "Low".to_string(),
        sentiment_score: "Neutral".to_string(),
        ai_summary: "Summarization timed out.".to_string(),
        ..Default::default()
    }
}

fn history_to_messages(history: Vec<veribot_memory::ChatMessage>) -> Vec<ProviderMessage> {
    history
        .into_iter()
        .map(|m| ProviderMessage {
            role: match m.role {
                ChatRole::User => ProviderRole::User,
                ChatRole::Assistant => ProviderRole::Assistant,
                ChatRole::System => ProviderRole::System,
            },
            content: m.content,
        })
        .collect()
}
