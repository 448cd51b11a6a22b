use serde::{Deserialize, Serialize};

/// Preferred-language directive for answer generation: an ordered list of
/// BCP-47-ish tags (e.g. `["pt-BR", "en"]`); the first entry wins when the
/// user's language cannot be detected from the query.
pub type PreferredLanguages = Vec<String>;

/// Result of `RAGEngine::ingest_document`: how many chunks were produced and
/// how many of those were actually persisted (ingestion is best-effort per
/// chunk).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResult {
    pub filename: String,
    pub chunks_total: usize,
    pub chunks_inserted: usize,
}

/// Caller-supplied routing inputs to `RAGEngine::query`. Intent routing
/// (when to use hyde/rerank, which provider, whether this is small talk) is
/// the caller's — in practice `AgentRuntime`'s — responsibility, not
/// `RagEngine`'s.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub session_id: Option<String>,
    pub use_hyde: bool,
    pub use_rerank: bool,
    pub provider: Option<String>,
    pub external_context: Option<String>,
    pub small_talk: bool,
    pub preferred_languages: PreferredLanguages,
}

/// Result of `RAGEngine::query`: the generated answer plus whether retrieved
/// document context was actually used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer_text: String,
    pub references_used: bool,
}
