use std::collections::HashMap;
use std::sync::Arc;

use veribot_core::LlmConfig;

use crate::provider::{LlmProvider, Step};

/// Registry of named LLM provider instances plus the step→provider
/// resolution table. Provider instances are constructed once at startup and
/// looked up by name — a provider instance here is stateless with respect
/// to `model` (the model name is passed per-call), so caching by name alone
/// is enough to make repeated resolution cheap.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    default_provider: String,
}

impl ProviderRegistry {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self { providers: HashMap::new(), default_provider: default_provider.into() }
    }

    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(name).cloned()
    }

    /// Resolve `(provider, model)` for a logical step from the tenant's
    /// `LlmConfig`, falling back to the registry's default provider when the
    /// step's configured provider name is empty or unknown.
    pub fn resolve(&self, llm_config: Option<&LlmConfig>, step: Step) -> Option<(Arc<dyn LlmProvider>, String)> {
        let step_provider = llm_config.map(|c| c.resolve(step.as_str()));
        let (provider_name, model) = match step_provider {
            Some(sp) if !sp.provider.is_empty() => (sp.provider, sp.model),
            Some(sp) => (self.default_provider.clone(), sp.model),
            None => (self.default_provider.clone(), default_model_for(step)),
        };
        self.get(&provider_name)
            .or_else(|| self.get(&self.default_provider))
            .map(|p| (p, model))
    }
}

fn default_model_for(step: Step) -> String {
    match step {
        Step::Transcription => "whisper-1".to_string(),
        Step::ImageDescription => "claude-3-5-sonnet-latest".to_string(),
        _ => "claude-3-5-sonnet-latest".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::EchoProvider;

    #[test]
    fn resolve_falls_back_to_default_provider() {
        let mut reg = ProviderRegistry::new("echo");
        reg.register(Arc::new(EchoProvider::new(8)));
        let (provider, model) = reg.resolve(None, Step::Generation).unwrap();
        assert_eq!(provider.name(), "echo");
        assert!(!model.is_empty());
    }
}
