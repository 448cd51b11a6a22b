use std::sync::Arc;

use async_trait::async_trait;
use veribot_rag::{QueryOptions, RagEngine};

use super::{Tool, ToolResult};

/// `search_knowledge_base(query)`: delegates to `RagEngine::query` for the
/// tenant/session this tool instance is bound to.
pub struct SearchKnowledgeBaseTool {
    rag: Arc<RagEngine>,
    tenant_id: String,
    session_id: Option<String>,
    use_hyde: bool,
    use_rerank: bool,
    preferred_languages: Vec<String>,
}

impl SearchKnowledgeBaseTool {
    pub fn new(
        rag: Arc<RagEngine>,
        tenant_id: impl Into<String>,
        session_id: Option<String>,
        use_hyde: bool,
        use_rerank: bool,
        preferred_languages: Vec<String>,
    ) -> Self {
        Self { rag, tenant_id: tenant_id.into(), session_id, use_hyde, use_rerank, preferred_languages }
    }
}

#[async_trait]
impl Tool for SearchKnowledgeBaseTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Search the tenant's knowledge base for information relevant to the user's question. \
         Use this whenever the user asks something that might be answered by ingested documents \
         (product details, policies, procedures)."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question or topic to search for."
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let query = match input.get("query").and_then(|v| v.as_str()) {
            Some(q) if !q.trim().is_empty() => q.to_string(),
            _ => return ToolResult::error("missing required parameter: query"),
        };

        let opts = QueryOptions {
            session_id: self.session_id.clone(),
            use_hyde: self.use_hyde,
            use_rerank: self.use_rerank,
            provider: None,
            external_context: None,
            small_talk: false,
            preferred_languages: self.preferred_languages.clone(),
        };

        match self.rag.query(&self.tenant_id, &query, &opts).await {
            Ok(result) if result.references_used => ToolResult::success(result.answer_text),
            Ok(result) => ToolResult::success(format!("No matching documents found. {}", result.answer_text)),
            Err(e) => ToolResult::error(format!("search_knowledge_base failed: {e}")),
        }
    }
}
