use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreError, Result};

pub const DEFAULT_PORT: u16 = 8088;
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Fixed deployment-wide embedding dimension. Re-ingesting every tenant's
/// documents (schema reinitialization) is required if this ever changes.
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Process-wide configuration (`veribot.toml` + `VERIBOT_*` env overrides),
/// loaded once at startup the way skynet-core's `SkynetConfig::load` does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeriBotConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    #[serde(default)]
    pub webhooks: WebhooksConfig,
}

fn default_embedding_dim() -> usize {
    DEFAULT_EMBEDDING_DIM
}

impl Default for VeriBotConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            webhooks: WebhooksConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    std::env::var("VERIBOT_DB_PATH").unwrap_or_else(|_| "./veribot.db".to_string())
}

/// Webhook ingress subsystem configuration (HMAC/bearer auth per source,
/// mirroring skynet-core's `WebhooksConfig`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhooksConfig {
    #[serde(default)]
    pub evolution_hmac_secret: Option<String>,
    #[serde(default)]
    pub chatwoot_hmac_secret: Option<String>,
}

impl VeriBotConfig {
    /// Load from a TOML file with `VERIBOT_*` env var overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(|| "./veribot.toml".to_string());

        Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("VERIBOT_").split("_"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }
}

/// Per-tenant configuration bundle, one optional section per integration
/// (`rag`, `chatwoot`, `evolution`, `telegram`, `espocrm`, `hubspot`,
/// `client_config`, `llm_config`). Each entry is validated lazily by the
/// component that consumes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantConfig {
    #[serde(default)]
    pub rag: Option<RagConfig>,
    #[serde(default)]
    pub chatwoot: Option<ChatwootConfig>,
    #[serde(default)]
    pub evolution: Option<EvolutionConfig>,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub espocrm: Option<EspoCrmConfig>,
    #[serde(default)]
    pub hubspot: Option<HubSpotConfig>,
    #[serde(default)]
    pub client_config: Option<ClientConfig>,
    #[serde(default)]
    pub llm_config: Option<LlmConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub tenant_id: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub use_hyde: Option<bool>,
    #[serde(default)]
    pub use_rerank: Option<bool>,
    #[serde(default)]
    pub handoff_rules: Option<serde_json::Value>,
    #[serde(default)]
    pub google_sheets_url: Option<String>,
    #[serde(default)]
    pub semantic_cache: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatwootConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_account_id")]
    pub account_id: u64,
}

fn default_account_id() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EspoCrmConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSpotConfig {
    pub access_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub custom_instructions: Option<String>,
    #[serde(default)]
    pub is_enterprise: bool,
}

/// Step → {provider, model} routing table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub steps: HashMap<String, StepProvider>,
    pub default_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepProvider {
    pub provider: String,
    pub model: String,
}

impl LlmConfig {
    /// Resolve the (provider, model) pair for a logical step, falling back
    /// to `default_model` on an unconfigured/unknown provider (empty
    /// string signals "use whatever default provider is registered").
    pub fn resolve(&self, step: &str) -> StepProvider {
        self.steps.get(step).cloned().unwrap_or(StepProvider {
            provider: String::new(),
            model: self.default_model.clone(),
        })
    }
}
