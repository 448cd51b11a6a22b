pub mod lookup_pricing;
pub mod search_knowledge_base;
pub mod transfer_to_human;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use veribot_providers::ToolDefinition;

pub use lookup_pricing::LookupPricingTool;
pub use search_knowledge_base::SearchKnowledgeBaseTool;
pub use transfer_to_human::TransferToHumanTool;

/// Result of executing a tool, fed back to the model as a `tool_result` turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self { content: content.into(), is_error: false }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { content: message.into(), is_error: true }
    }
}

/// One tool exposed to the model during `AgentRuntime::run`.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> serde_json::Value;
    async fn execute(&self, input: serde_json::Value) -> ToolResult;
}

pub fn to_definitions(tools: &[Box<dyn Tool>]) -> Vec<ToolDefinition> {
    tools
        .iter()
        .map(|t| ToolDefinition {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect()
}
