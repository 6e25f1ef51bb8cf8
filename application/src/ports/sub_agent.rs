//! Sub-agent port
//!
//! The Task tool hands a self-contained prompt to a sub-agent and waits for
//! its final answer. The sub-agent is another conversation run; see
//! [`NestedAgentRunner`](crate::use_cases::delegate_task::NestedAgentRunner).

use async_trait::async_trait;
use thiserror::Error;

/// Agent type every runner understands
pub const GENERAL_PURPOSE_AGENT: &str = "general-purpose";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubAgentError {
    #[error("Unknown subagent_type '{requested}'. Available agent types: {available}")]
    UnknownAgentType {
        requested: String,
        available: String,
    },

    #[error("Sub-agent failed: {0}")]
    Failed(String),

    #[error("Sub-agent finished without a final answer")]
    NoAnswer,
}

/// One delegated task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAgentRequest {
    /// Short (3-5 word) label
    pub description: String,
    /// Full instructions for the sub-agent
    pub prompt: String,
    pub agent_type: String,
}

#[async_trait]
pub trait SubAgentPort: Send + Sync {
    /// Agent types this port can run
    fn agent_types(&self) -> Vec<String>;

    /// Run the task to completion and return the sub-agent's final answer.
    async fn run(&self, request: SubAgentRequest) -> Result<String, SubAgentError>;
}
