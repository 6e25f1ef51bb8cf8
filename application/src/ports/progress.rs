//! Progress notification port
//!
//! Defines the callbacks the orchestrator fires while a turn runs. The
//! presentation layer renders them; every method has a no-op default.

use klaude_domain::{ToolInvocationRequest, ToolResult};

/// Callback for progress updates during a conversation turn
pub trait ConversationProgress: Send + Sync {
    /// A completion request is about to be sent
    fn on_completion_start(&self) {}

    /// The completion request returned (successfully or not)
    fn on_completion_end(&self) {}

    /// The model produced text
    fn on_assistant_text(&self, _text: &str) {}

    /// A tool call is about to be dispatched
    fn on_tool_call(&self, _request: &ToolInvocationRequest) {}

    /// A tool call finished; fired in completion order
    fn on_tool_result(&self, _result: &ToolResult) {}

    /// Something the user should see but that does not fail the turn
    fn on_warning(&self, _message: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ConversationProgress for NoProgress {}
