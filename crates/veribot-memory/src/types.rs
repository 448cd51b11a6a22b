use serde::{Deserialize, Serialize};

/// One ingested, embedded chunk of a tenant's knowledge base document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: i64,
    pub tenant_id: String,
    pub filename: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub created_at: String,
}

/// A hybrid-search hit: a chunk plus its fused RRF score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            "system" => Ok(ChatRole::System),
            other => Err(format!("unknown chat role: {other}")),
        }
    }
}

/// One turn of RAG conversation memory, scoped to a `chat_session_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: String,
}

/// A cached (query, answer) pair for the opt-in semantic cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedQuery {
    pub id: i64,
    pub tenant_id: String,
    pub query_text: String,
    pub embedding: Vec<f32>,
    pub answer_text: String,
    pub created_at: String,
}
