use std::net::SocketAddr;
use std::sync::Arc;

use rusqlite::Connection;
use tracing::{info, warn};
use veribot_agent::AgentRuntimeCache;
use veribot_core::VeriBotConfig;
use veribot_memory::{ChatMemory, DocumentStore, QueryCache};
use veribot_providers::{AnthropicProvider, EchoProvider, EmbeddingProvider, OpenAiCompatProvider, ProviderRegistry};
use veribot_sessions::{BindingLocks, QuotaGuard, SessionStore};
use veribot_tenants::TenantRegistry;

mod app;
mod auth;
mod http;
mod orchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "veribot_gateway=info,tower_http=debug".into()),
        )
        .init();

    let config_path = std::env::var("VERIBOT_CONFIG").ok();
    let config = VeriBotConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("config load failed ({e}), using defaults");
        VeriBotConfig::default()
    });

    let db_path = config.database.path.clone();
    let tenants_db = open_connection(&db_path)?;
    veribot_tenants::db::init_db(&tenants_db)?;
    let tenants = Arc::new(TenantRegistry::new(Arc::new(std::sync::Mutex::new(tenants_db))));

    let sessions_db = open_connection(&db_path)?;
    veribot_sessions::db::init_db(&sessions_db)?;
    let sessions = Arc::new(SessionStore::new(sessions_db));

    let documents_db = open_connection(&db_path)?;
    veribot_memory::db::init_db(&documents_db)?;
    let documents = Arc::new(DocumentStore::new(documents_db));

    let chat_memory_db = open_connection(&db_path)?;
    let chat_memory = Arc::new(ChatMemory::new(chat_memory_db));

    let query_cache_db = open_connection(&db_path)?;
    let query_cache = Arc::new(QueryCache::new(query_cache_db));

    let quota = Arc::new(QuotaGuard::new(tenants.clone()));
    let binding_locks = Arc::new(BindingLocks::new());

    let (providers, default_provider_name) = build_provider_registry();
    let providers = Arc::new(providers);

    let embedding_dim = config.embedding_dim;
    let embedder = build_embedder(embedding_dim);

    let agent_cache = Arc::new(AgentRuntimeCache::new());

    info!(default_provider = %default_provider_name, embedding_dim, "providers configured");

    let state = Arc::new(app::AppState::new(
        config.clone(),
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
    ));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    info!("VeriBot gateway listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn open_connection(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// Register every LLM provider with credentials present in the environment.
/// `VERIBOT_ANTHROPIC_API_KEY` and `VERIBOT_OPENAI_API_KEY` are the only two
/// first-party providers; any tenant whose `llm_config` names a provider not
/// registered here falls back through `ProviderRegistry::resolve` to the
/// default, and ultimately to `EchoProvider` if nothing at all is configured
/// — keeps the gateway runnable in development with no external credentials.
fn build_provider_registry() -> (ProviderRegistry, String) {
    let mut default_provider = "echo".to_string();
    let mut registered_any = false;

    let mut registry = ProviderRegistry::new("echo");
    registry.register(Arc::new(EchoProvider::new(1536)));

    if let Ok(key) = std::env::var("VERIBOT_ANTHROPIC_API_KEY") {
        registry.register(Arc::new(AnthropicProvider::new(key, std::env::var("VERIBOT_ANTHROPIC_BASE_URL").ok())));
        default_provider = "anthropic".to_string();
        registered_any = true;
    }
    if let Ok(key) = std::env::var("VERIBOT_OPENAI_API_KEY") {
        let base_url = std::env::var("VERIBOT_OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());
        registry.register(Arc::new(OpenAiCompatProvider::new("openai", key, base_url, 1536)));
        if !registered_any {
            default_provider = "openai".to_string();
        }
    }

    if !registered_any {
        warn!("no VERIBOT_ANTHROPIC_API_KEY or VERIBOT_OPENAI_API_KEY set, generation falls back to the echo provider");
    }
    (registry, default_provider)
}

fn build_embedder(embedding_dim: usize) -> Arc<dyn EmbeddingProvider> {
    if let Ok(key) = std::env::var("VERIBOT_OPENAI_API_KEY") {
        let base_url = std::env::var("VERIBOT_OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());
        return Arc::new(OpenAiCompatProvider::new("openai", key, base_url, embedding_dim));
    }
    warn!("no embedding-capable provider configured, falling back to the echo provider (retrieval will be non-semantic)");
    Arc::new(EchoProvider::new(embedding_dim))
}
