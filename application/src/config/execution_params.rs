//! Execution parameters: conversation loop control.
//!
//! [`ExecutionParams`] groups the static parameters that bound the tool loop
//! in [`ConversationOrchestrator`](crate::use_cases::run_conversation::ConversationOrchestrator).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};

/// Execution loop control parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Maximum tool-dispatch rounds for one user message.
    pub max_tool_turns: usize,
    /// Worker-pool size for tool calls from one model turn.
    pub max_parallel_tools: usize,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_tool_turns: 50,
            max_parallel_tools: 8,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_tool_turns(mut self, max: usize) -> Self {
        self.max_tool_turns = max;
        self
    }

    /// Zero is raised to one so dispatch always makes progress.
    pub fn with_max_parallel_tools(mut self, max: usize) -> Self {
        self.max_parallel_tools = max.max(1);
        self
    }
}
