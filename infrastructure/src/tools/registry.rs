//! Tool Registry
//!
//! The [`ToolRegistry`] maps tool names to [`Tool`] instances and implements
//! [`ToolExecutorPort`]. Tools keep their registration order, which is the
//! order their schemas are advertised in.
//!
//! # Usage
//!
//! ```ignore
//! use klaude_infrastructure::tools::{ToolRegistry, ReadTool, WriteTool};
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(ReadTool::new());
//! registry.register(WriteTool::new());
//!
//! let call = ToolCall::new("Read").with_arg("file_path", "/tmp/notes.txt");
//! let text = registry.execute_tool(&call).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use klaude_application::{RegistryError, ToolExecutorPort, ToolSchemaPort};
use klaude_domain::{DefaultToolValidator, Tool, ToolCall, ToolDefinition, ToolValidator};
use serde_json::Value;

/// Name-indexed set of tools.
#[derive(Default)]
pub struct ToolRegistry {
    /// Tools in registration order
    tools: Vec<Arc<dyn Tool>>,
    /// Tool name -> index into `tools`
    index: HashMap<String, usize>,
    validator: DefaultToolValidator,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&i) => {
                tracing::debug!(tool = %name, "Replacing registered tool");
                self.tools[i] = tool;
            }
            None => {
                tracing::debug!(tool = %name, "Registered tool");
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// API schemas for every tool, in registration order.
    pub fn get_all_schemas(&self, converter: &dyn ToolSchemaPort) -> Vec<Value> {
        converter.all_tools_schema(&self.definitions())
    }
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition().clone()).collect()
    }

    fn has_tool(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    async fn execute_tool(&self, call: &ToolCall) -> Result<String, RegistryError> {
        let Some(tool) = self.get(&call.tool_name) else {
            tracing::warn!(tool = %call.tool_name, "Model requested an unknown tool");
            return Err(RegistryError::UnknownTool(call.tool_name.clone()));
        };

        self.validator.validate(call, tool.definition())?;

        tracing::debug!(tool = %call.tool_name, call_id = ?call.call_id, "Executing tool");
        Ok(tool.execute(call).await?)
    }
}
