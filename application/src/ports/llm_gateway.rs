//! LLM Gateway port
//!
//! Defines the interface for communicating with LLM providers. The
//! orchestrator only needs one operation: send the conversation so far plus
//! the advertised tool schemas, and get back one model turn.

use async_trait::async_trait;
use klaude_domain::{LlmResponse, Message};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for LLM communication
///
/// This port defines how the application layer communicates with LLM providers.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Model identifier used for requests (for logs and display)
    fn model_name(&self) -> &str;

    /// Request one completion for `messages`, advertising `tools`.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Value],
    ) -> Result<LlmResponse, GatewayError>;
}
