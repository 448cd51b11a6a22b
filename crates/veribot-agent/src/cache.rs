use std::sync::Arc;

use dashmap::DashMap;
use veribot_providers::LlmProvider;

use crate::runtime::AgentRuntime;

/// In-process cache of `AgentRuntime` instances keyed by `(provider, model)`,
/// mirroring the `{provider -> model}` cache key `LLMProvider` already uses
/// for its own instances.
#[derive(Default)]
pub struct AgentRuntimeCache {
    runtimes: DashMap<(String, String), Arc<AgentRuntime>>,
}

impl AgentRuntimeCache {
    pub fn new() -> Self {
        Self { runtimes: DashMap::new() }
    }

    pub fn get_or_create(
        &self,
        provider: Arc<dyn LlmProvider>,
        model: &str,
        system_prompt: &str,
    ) -> Arc<AgentRuntime> {
        let key = (provider.name().to_string(), model.to_string());
        if let Some(existing) = self.runtimes.get(&key) {
            return existing.clone();
        }
        let runtime = Arc::new(AgentRuntime::new(provider, model, system_prompt));
        self.runtimes.insert(key, runtime.clone());
        runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veribot_providers::EchoProvider;

    #[test]
    fn get_or_create_reuses_instance_for_same_key() {
        let cache = AgentRuntimeCache::new();
        let provider: Arc<dyn LlmProvider> = Arc::new(EchoProvider::new(8));
        let a = cache.get_or_create(provider.clone(), "echo-model", "system");
        let b = cache.get_or_create(provider, "echo-model", "system");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
