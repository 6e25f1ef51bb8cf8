//! Task tool: delegate a self-contained job to a sub-agent.

use async_trait::async_trait;
use klaude_application::{SubAgentError, SubAgentPort, SubAgentRequest};
use klaude_domain::{Tool, ToolCall, ToolDefinition, ToolError, ToolParameter};
use std::sync::Arc;
use tracing::info;

/// Tool name constant
pub const TASK: &str = "Task";

pub struct TaskTool {
    definition: ToolDefinition,
    agents: Arc<dyn SubAgentPort>,
}

impl TaskTool {
    pub fn new(agents: Arc<dyn SubAgentPort>) -> Self {
        let types = agents.agent_types().join(", ");
        let definition = ToolDefinition::new(
            TASK,
            format!(
                "Launch a new agent to handle complex, multi-step tasks autonomously. The agent \
                 starts with no context, so the prompt must be self-contained and say exactly \
                 what to report back. Only the agent's final message is returned. Available \
                 agent types: {}.",
                types
            ),
        )
        .with_parameter(ToolParameter::new(
            "description",
            "A short (3-5 word) description of the task",
            true,
        ))
        .with_parameter(ToolParameter::new(
            "prompt",
            "The task for the agent to perform",
            true,
        ))
        .with_parameter(ToolParameter::new(
            "subagent_type",
            "The type of specialized agent to use for this task",
            true,
        ));
        Self { definition, agents }
    }
}

#[async_trait]
impl Tool for TaskTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let request = SubAgentRequest {
            description: call.require_string("description")?.to_string(),
            prompt: call.require_string("prompt")?.to_string(),
            agent_type: call.require_string("subagent_type")?.to_string(),
        };
        let description = request.description.clone();
        let agent_type = request.agent_type.clone();
        info!(task = %description, agent = %agent_type, "Delegating task");

        let answer = self.agents.run(request).await.map_err(|e| match e {
            SubAgentError::UnknownAgentType { .. } => {
                ToolError::invalid_argument(format!("Error: {}", e))
            }
            _ => ToolError::execution_failed(format!("Error: {}", e)),
        })?;

        let payload = serde_json::json!({
            "type": "text",
            "text": format!(
                "Task '{}' completed by {} agent.\n\n{}",
                description, agent_type, answer
            ),
        });
        Ok(payload.to_string())
    }
}
