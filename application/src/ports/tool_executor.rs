//! Tool Executor port
//!
//! Defines how the application layer looks up and runs tools by name.
//! The infrastructure tool registry is the implementation.

use async_trait::async_trait;
use klaude_domain::{ToolCall, ToolDefinition, ToolError};
use thiserror::Error;

/// Dispatch failures, kept apart from tool-level errors.
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    /// The model asked for a tool that is not registered
    #[error("Error: Tool '{0}' not found")]
    UnknownTool(String),

    /// The tool ran and reported an error
    #[error("{}", .0.message)]
    Tool(#[from] ToolError),
}

/// Port for tool execution
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Definitions of every registered tool, in registration order
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Check if a tool is available
    fn has_tool(&self, name: &str) -> bool {
        self.definitions().iter().any(|d| d.name == name)
    }

    /// Names of all registered tools, in registration order
    fn available_tools(&self) -> Vec<String> {
        self.definitions().into_iter().map(|d| d.name).collect()
    }

    /// Validate and run one call, returning the tool's text verbatim.
    async fn execute_tool(&self, call: &ToolCall) -> Result<String, RegistryError>;
}
