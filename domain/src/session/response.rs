//! LLM response types for the tool-calling loop.
//!
//! A model turn is text, zero or more [`ToolInvocationRequest`]s, and a
//! [`FinishReason`] telling the orchestrator what to do next.
//!
//! ```text
//! FinishReason::Stop       → final answer, wait for the user
//! FinishReason::ToolCalls  → dispatch requests, ask again
//! anything else            → warn and stop the loop
//! ```

use serde::{Deserialize, Serialize};

/// A single tool call requested by the model.
///
/// `arguments` is the raw payload exactly as produced by the model; it is
/// decoded only at dispatch time so malformed payloads can be reported back
/// as tool errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Identifier assigned by the model (e.g. "call_abc123")
    pub call_id: String,
    /// Requested tool name
    pub tool_name: String,
    /// Raw JSON argument payload
    pub arguments: String,
}

impl ToolInvocationRequest {
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Final answer; return control to the user
    Stop,
    /// The turn carries tool-call requests
    ToolCalls,
    /// Output was cut at the token limit
    Length,
    /// Provider-side content filter
    ContentFilter,
    /// Any other provider-specific signal
    Other(String),
}

impl FinishReason {
    /// Parse an OpenAI-style `finish_reason` string.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "tool_calls" | "function_call" => FinishReason::ToolCalls,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other(s) => s,
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One assistant turn returned by the completion collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Assistant text, if any
    pub content: Option<String>,
    /// Tool calls requested in this turn
    #[serde(default)]
    pub tool_calls: Vec<ToolInvocationRequest>,
    /// Termination signal
    pub finish_reason: FinishReason,
    /// Model that produced the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl LlmResponse {
    /// Create a plain text response that ends the turn.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            model: None,
        }
    }

    /// Create a response requesting the given tool calls.
    pub fn with_tool_calls(tool_calls: Vec<ToolInvocationRequest>) -> Self {
        Self {
            content: None,
            tool_calls,
            finish_reason: FinishReason::ToolCalls,
            model: None,
        }
    }

    /// Assistant text, empty when absent.
    pub fn text_content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_reason_from_wire() {
        assert_eq!(FinishReason::from_wire("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from_wire("tool_calls"), FinishReason::ToolCalls);
        assert_eq!(FinishReason::from_wire("length"), FinishReason::Length);
        assert_eq!(
            FinishReason::from_wire("weird"),
            FinishReason::Other("weird".to_string())
        );
        assert_eq!(FinishReason::from_wire("weird").to_string(), "weird");
    }

    #[test]
    fn test_response_helpers() {
        let text = LlmResponse::from_text("done");
        assert_eq!(text.text_content(), "done");
        assert!(!text.has_tool_calls());

        let calls = LlmResponse::with_tool_calls(vec![ToolInvocationRequest::new(
            "call_1", "LS", "{}",
        )]);
        assert_eq!(calls.text_content(), "");
        assert!(calls.has_tool_calls());
        assert_eq!(calls.finish_reason, FinishReason::ToolCalls);
    }
}
