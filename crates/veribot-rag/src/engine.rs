use std::sync::Arc;

use veribot_core::LlmConfig;
use veribot_memory::{ChatMemory, DocumentStore, QueryCache};
use veribot_providers::{EmbeddingProvider, ProviderRegistry};

/// Assembles document storage, chat memory, the semantic cache, and the LLM
/// provider registry into the retrieval-augmented generation pipeline
/// described by the ingestion/query split in `ingest.rs`/`query.rs`.
pub struct RagEngine {
    pub(crate) documents: Arc<DocumentStore>,
    pub(crate) chat_memory: Arc<ChatMemory>,
    pub(crate) query_cache: Arc<QueryCache>,
    pub(crate) providers: Arc<ProviderRegistry>,
    pub(crate) embedder: Arc<dyn EmbeddingProvider>,
    pub(crate) embedding_dim: usize,
    pub(crate) llm_config: Option<LlmConfig>,
    /// Base number of chunks returned by a query before any rerank widening
    /// (k = base limit × 4 if reranking else base limit).
    pub(crate) base_limit: usize,
}

impl RagEngine {
    pub fn new(
        documents: Arc<DocumentStore>,
        chat_memory: Arc<ChatMemory>,
        query_cache: Arc<QueryCache>,
        providers: Arc<ProviderRegistry>,
        embedder: Arc<dyn EmbeddingProvider>,
        embedding_dim: usize,
    ) -> Self {
        Self {
            documents,
            chat_memory,
            query_cache,
            providers,
            embedder,
            embedding_dim,
            llm_config: None,
            base_limit: 5,
        }
    }

    /// Attach a per-tenant step→{provider,model} routing table; without one
    /// every step falls back to the registry's default provider.
    pub fn with_llm_config(mut self, llm_config: Option<LlmConfig>) -> Self {
        self.llm_config = llm_config;
        self
    }

    pub fn with_base_limit(mut self, base_limit: usize) -> Self {
        self.base_limit = base_limit;
        self
    }
}
