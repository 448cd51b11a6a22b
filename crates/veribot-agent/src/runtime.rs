use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use veribot_providers::{ChatMessage, LlmProvider};

use crate::error::{AgentError, Result};
use crate::tools::{to_definitions, Tool, TransferToHumanTool};

/// Bounded tool-using loop:
/// `INIT → MODEL_CALL → (tool_calls? → TOOL_EXEC → MODEL_CALL) | (final text → DONE)`.
const MAX_ITERATIONS: usize = 6;

/// Outcome of one `AgentRuntime::run` call.
#[derive(Debug, Clone)]
pub struct AgentRunResult {
    pub final_text: String,
    pub requires_human: bool,
    pub iterations: usize,
}

/// A model-bound agent instance. Parameterized by provider/model only —
/// tools are passed into `run` per conversation since they close over
/// tenant/session context that varies per call.
pub struct AgentRuntime {
    provider: Arc<dyn LlmProvider>,
    model: String,
    system_prompt: String,
}

impl AgentRuntime {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self { provider, model: model.into(), system_prompt: system_prompt.into() }
    }

    /// Build the standard tool set for one conversation turn: knowledge-base
    /// search, pricing lookup, and human handoff. `requires_human` is shared
    /// with the caller so it can be read after `run` completes.
    pub fn build_tools(
        requires_human: Arc<AtomicBool>,
        search_knowledge_base: Box<dyn Tool>,
        lookup_pricing: Box<dyn Tool>,
    ) -> Vec<Box<dyn Tool>> {
        vec![search_knowledge_base, lookup_pricing, Box::new(TransferToHumanTool::new(requires_human))]
    }

    /// Run the bounded tool loop over `messages` (mutated in place so the
    /// caller can persist the full turn history), returning the final answer
    /// and whether any tool call requested a human handoff.
    pub async fn run(
        &self,
        tools: &[Box<dyn Tool>],
        messages: &mut Vec<ChatMessage>,
        requires_human: &Arc<AtomicBool>,
    ) -> Result<AgentRunResult> {
        let tool_defs = to_definitions(tools);

        for iteration in 0..MAX_ITERATIONS {
            debug!(iteration, "agent loop iteration");
            let response = self.provider.chat(&self.model, &self.system_prompt, messages, &tool_defs).await?;

            if !response.has_tool_calls() {
                messages.push(ChatMessage::assistant(response.text.clone()));
                info!(iteration, "agent loop complete");
                return Ok(AgentRunResult {
                    final_text: response.text,
                    requires_human: requires_human.load(Ordering::SeqCst),
                    iterations: iteration + 1,
                });
            }

            if !response.text.trim().is_empty() {
                messages.push(ChatMessage::assistant(response.text.clone()));
            }

            let mut observations = String::new();
            for call in &response.tool_calls {
                let tool = tools.iter().find(|t| t.name() == call.name);
                let result = match tool {
                    Some(tool) => tool.execute(call.input.clone()).await,
                    None => crate::tools::ToolResult::error(format!("unknown tool: {}", call.name)),
                };
                observations.push_str(&format!(
                    "Tool '{}' {}: {}\n",
                    call.name,
                    if result.is_error { "error" } else { "result" },
                    result.content
                ));
            }
            messages.push(ChatMessage::user(observations));
        }

        warn!(max_iterations = MAX_ITERATIONS, "agent loop hit maximum iterations");
        Err(AgentError::MaxIterations(MAX_ITERATIONS))
    }
}
