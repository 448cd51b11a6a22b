use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use veribot_agent::AgentRuntimeCache;
use veribot_channels::ChannelAdapter;
use veribot_chatwoot::ChatwootAdapter;
use veribot_core::VeriBotConfig;
use veribot_crm::CrmAdapter;
use veribot_evolution::EvolutionAdapter;
use veribot_memory::{ChatMemory, DocumentStore, QueryCache};
use veribot_providers::{EmbeddingProvider, ProviderRegistry};
use veribot_sessions::{BindingLocks, QuotaGuard, SessionStore};
use veribot_telegram::TelegramAdapter;
use veribot_tenants::{Tenant, TenantRegistry};

/// Central shared state, passed as `Arc<AppState>` to every Axum handler —
/// the same role skynet-gateway's `AppState` plays, generalized from one
/// bundled agent/memory/session trio to the multi-tenant collaborator set
/// this gateway wires together.
pub struct AppState {
    pub config: VeriBotConfig,
    pub tenants: Arc<TenantRegistry>,
    pub sessions: Arc<SessionStore>,
    pub quota: Arc<QuotaGuard>,
    pub binding_locks: Arc<BindingLocks>,
    pub documents: Arc<DocumentStore>,
    pub chat_memory: Arc<ChatMemory>,
    pub query_cache: Arc<QueryCache>,
    pub providers: Arc<ProviderRegistry>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub embedding_dim: usize,
    pub agent_cache: Arc<AgentRuntimeCache>,
    pub telegram: Arc<TelegramAdapter>,
    pub http_client: reqwest::Client,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: VeriBotConfig,
        tenants: Arc<TenantRegistry>,
        sessions: Arc<SessionStore>,
        quota: Arc<QuotaGuard>,
        binding_locks: Arc<BindingLocks>,
        documents: Arc<DocumentStore>,
        chat_memory: Arc<ChatMemory>,
        query_cache: Arc<QueryCache>,
        providers: Arc<ProviderRegistry>,
        embedder: Arc<dyn EmbeddingProvider>,
        embedding_dim: usize,
        agent_cache: Arc<AgentRuntimeCache>,
    ) -> Self {
        Self {
            config,
            tenants,
            sessions,
            quota,
            binding_locks,
            documents,
            chat_memory,
            query_cache,
            providers,
            embedder,
            embedding_dim,
            agent_cache,
            telegram: Arc::new(TelegramAdapter::new()),
            http_client: reqwest::Client::new(),
        }
    }

    /// Build a tenant-configured Evolution adapter. Cheap enough (one
    /// `reqwest::Client` plus two owned strings) to construct per request —
    /// tenants may rotate their Evolution credentials without a gateway
    /// restart picking them up only on the next tenant-cache refresh.
    pub fn evolution_adapter(&self, tenant: &Tenant) -> Option<EvolutionAdapter> {
        let cfg = tenant.config.evolution.as_ref()?;
        Some(EvolutionAdapter::new(cfg.base_url.clone(), cfg.api_key.clone()))
    }

    pub fn chatwoot_adapter(&self, tenant: &Tenant) -> Option<ChatwootAdapter> {
        let cfg = tenant.config.chatwoot.as_ref()?;
        Some(ChatwootAdapter::new(cfg.base_url.clone(), cfg.api_key.clone(), cfg.account_id))
    }

    /// Resolve the channel adapter a given tenant-key/channel pair should use
    /// for outbound replies. Telegram is process-wide (the bot token lives
    /// in the URL, not in per-tenant config), Evolution/Chatwoot need the
    /// tenant's own base_url/api_key.
    pub fn channel_adapter(&self, channel: veribot_channels::Channel, tenant: &Tenant) -> Option<Arc<dyn ChannelAdapter>> {
        match channel {
            veribot_channels::Channel::Telegram => Some(self.telegram.clone() as Arc<dyn ChannelAdapter>),
            veribot_channels::Channel::Evolution => {
                self.evolution_adapter(tenant).map(|a| Arc::new(a) as Arc<dyn ChannelAdapter>)
            }
            veribot_channels::Channel::Chatwoot => {
                self.chatwoot_adapter(tenant).map(|a| Arc::new(a) as Arc<dyn ChannelAdapter>)
            }
        }
    }

    /// Every CRM adapter a tenant has configured, for lead/contact/summary
    /// fan-out. A tenant with neither EspoCRM nor HubSpot configured gets an
    /// empty list — CRM sync is optional per tenant.
    pub fn crm_adapters(&self, tenant: &Tenant) -> Vec<Arc<dyn CrmAdapter>> {
        let mut adapters: Vec<Arc<dyn CrmAdapter>> = Vec::new();
        if let Some(cfg) = &tenant.config.espocrm {
            adapters.push(Arc::new(veribot_crm::EspoCrmAdapter::new(cfg.base_url.clone(), cfg.api_key.clone())));
        }
        if let Some(cfg) = &tenant.config.hubspot {
            adapters.push(Arc::new(veribot_crm::HubSpotAdapter::new(cfg.access_token.clone())));
        }
        adapters
    }

    /// Build a `RagEngine` scoped to one tenant's LLM routing table. RagEngine
    /// holds its step→provider config fixed at construction, so a fresh,
    /// cheap instance (all fields are `Arc` clones bar the config itself) is
    /// built per request rather than cached — the one thing that varies
    /// across tenants sharing the same document/provider backing store.
    pub fn rag_engine(&self, tenant: &Tenant) -> veribot_rag::RagEngine {
        veribot_rag::RagEngine::new(
            self.documents.clone(),
            self.chat_memory.clone(),
            self.query_cache.clone(),
            self.providers.clone(),
            self.embedder.clone(),
            self.embedding_dim,
        )
        .with_llm_config(tenant.config.llm_config.clone())
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/webhook/evolution", post(crate::http::webhooks::evolution_webhook))
        .route("/webhook/telegram/{bot_token}", post(crate::http::webhooks::telegram_webhook))
        .route("/webhook/chatwoot/{tenant_slug}", post(crate::http::webhooks::chatwoot_webhook))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
