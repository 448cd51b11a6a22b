use async_trait::async_trait;
use tracing::warn;

use super::{Tool, ToolResult};

/// `lookup_pricing(item?)`: a structured lookup from tenant config.
/// Tenants that maintain a published price list as a Google Sheet
/// (`rag.google_sheets_url`) get it fetched (as CSV) and grepped for `item`;
/// tenants without one get a plain "not configured" result rather than an
/// error, since pricing lookup is optional per tenant.
pub struct LookupPricingTool {
    client: reqwest::Client,
    google_sheets_url: Option<String>,
}

impl LookupPricingTool {
    pub fn new(client: reqwest::Client, google_sheets_url: Option<String>) -> Self {
        Self { client, google_sheets_url }
    }
}

#[async_trait]
impl Tool for LookupPricingTool {
    fn name(&self) -> &str {
        "lookup_pricing"
    }

    fn description(&self) -> &str {
        "Look up pricing information for a product or service the tenant offers. \
         Pass an item name to filter results, or omit it to see the full price list."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "item": {
                    "type": "string",
                    "description": "Optional product or service name to filter the price list by."
                }
            }
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let Some(url) = &self.google_sheets_url else {
            return ToolResult::success("No pricing source is configured for this tenant.");
        };

        let body = match self.client.get(url).send().await.and_then(|r| r.error_for_status()) {
            Ok(resp) => match resp.text().await {
                Ok(text) => text,
                Err(e) => return ToolResult::error(format!("failed reading price list: {e}")),
            },
            Err(e) => {
                warn!(error = %e, "pricing sheet fetch failed");
                return ToolResult::error(format!("failed fetching price list: {e}"));
            }
        };

        let item = input.get("item").and_then(|v| v.as_str()).map(str::trim).filter(|s| !s.is_empty());
        match item {
            None => ToolResult::success(truncate(&body, 4000)),
            Some(item) => {
                let matches: Vec<&str> = body
                    .lines()
                    .filter(|line| line.to_lowercase().contains(&item.to_lowercase()))
                    .collect();
                if matches.is_empty() {
                    ToolResult::success(format!("No pricing rows matched '{item}'."))
                } else {
                    ToolResult::success(matches.join("\n"))
                }
            }
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}\n... (truncated)")
    }
}
