//! Tool schema conversion port.
//!
//! Separates "which tools exist" (domain [`ToolDefinition`]) from "how they
//! are serialized for the chat API" (infrastructure).

use klaude_domain::ToolDefinition;
use serde_json::Value;

/// Port for converting tool definitions to the LLM API's function format.
pub trait ToolSchemaPort: Send + Sync {
    /// Convert a single tool definition to its API envelope.
    fn tool_to_schema(&self, tool: &ToolDefinition) -> Value;

    /// Convert all tools, keeping their order.
    fn all_tools_schema(&self, tools: &[ToolDefinition]) -> Vec<Value> {
        tools.iter().map(|t| self.tool_to_schema(t)).collect()
    }
}
