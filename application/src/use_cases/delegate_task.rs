//! Delegate Task use case.
//!
//! [`NestedAgentRunner`] implements [`SubAgentPort`] by running a fresh
//! [`ConversationOrchestrator`] for each task. Its tool executor is expected
//! to exclude the Task tool, which bounds delegation to one level.

use crate::config::ExecutionParams;
use crate::ports::conversation_logger::{ConversationLogger, NoConversationLogger};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::NoProgress;
use crate::ports::sub_agent::{
    GENERAL_PURPOSE_AGENT, SubAgentError, SubAgentPort, SubAgentRequest,
};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::ports::tool_schema::ToolSchemaPort;
use crate::use_cases::run_conversation::{ConversationOrchestrator, TurnStop};
use async_trait::async_trait;
use klaude_domain::core::string::preview;
use std::sync::Arc;
use tracing::{info, warn};

const SUB_AGENT_PROMPT: &str = "You are a sub-agent handling one delegated task. \
Use the available tools to complete it, then reply with a concise final report. \
The report is all the caller will see.";

pub struct NestedAgentRunner {
    gateway: Arc<dyn LlmGateway>,
    tool_executor: Arc<dyn ToolExecutorPort>,
    tool_schema: Arc<dyn ToolSchemaPort>,
    conversation_logger: Arc<dyn ConversationLogger>,
    params: ExecutionParams,
}

impl NestedAgentRunner {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tool_executor: Arc<dyn ToolExecutorPort>,
        tool_schema: Arc<dyn ToolSchemaPort>,
        params: ExecutionParams,
    ) -> Self {
        Self {
            gateway,
            tool_executor,
            tool_schema,
            conversation_logger: Arc::new(NoConversationLogger),
            params,
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }
}

#[async_trait]
impl SubAgentPort for NestedAgentRunner {
    fn agent_types(&self) -> Vec<String> {
        vec![GENERAL_PURPOSE_AGENT.to_string()]
    }

    async fn run(&self, request: SubAgentRequest) -> Result<String, SubAgentError> {
        if !self.agent_types().contains(&request.agent_type) {
            return Err(SubAgentError::UnknownAgentType {
                requested: request.agent_type,
                available: self.agent_types().join(", "),
            });
        }

        info!(
            "Sub-agent '{}' starting: {}",
            request.description,
            preview(&request.prompt, 80)
        );

        let mut orchestrator = ConversationOrchestrator::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.tool_executor),
            Arc::clone(&self.tool_schema),
            self.params.clone(),
        )
        .with_system_prompt(SUB_AGENT_PROMPT)
        .with_conversation_logger(Arc::clone(&self.conversation_logger));

        let outcome = orchestrator
            .run_turn(&request.prompt, &NoProgress)
            .await
            .map_err(|e| SubAgentError::Failed(e.to_string()))?;

        if outcome.stop != TurnStop::Completed {
            warn!(
                "Sub-agent '{}' stopped early: {:?}",
                request.description, outcome.stop
            );
        }
        info!(
            "Sub-agent '{}' finished after {} tool turns",
            request.description, outcome.tool_turns
        );

        outcome
            .final_text
            .or_else(|| orchestrator.conversation().last_assistant_text().map(str::to_string))
            .ok_or(SubAgentError::NoAnswer)
    }
}
