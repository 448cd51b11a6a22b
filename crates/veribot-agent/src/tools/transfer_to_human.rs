use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{Tool, ToolResult};

/// `transfer_to_human()`: sets an out-of-band `requires_human` flag the
/// runtime reads after the loop completes. Takes no arguments and always
/// succeeds — handoff is a signal, not an action that can fail.
pub struct TransferToHumanTool {
    requires_human: Arc<AtomicBool>,
}

impl TransferToHumanTool {
    pub fn new(requires_human: Arc<AtomicBool>) -> Self {
        Self { requires_human }
    }
}

#[async_trait]
impl Tool for TransferToHumanTool {
    fn name(&self) -> &str {
        "transfer_to_human"
    }

    fn description(&self) -> &str {
        "Hand the conversation off to a human agent. Call this when the user explicitly asks for \
         a human, the request is outside what you can help with, or you cannot resolve the issue."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: serde_json::Value) -> ToolResult {
        self.requires_human.store(true, Ordering::SeqCst);
        ToolResult::success("Handoff flagged — a human agent will take over this conversation.")
    }
}
