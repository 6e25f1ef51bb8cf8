//! Application layer for klaude
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ExecutionParams;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway},
    progress::{ConversationProgress, NoProgress},
    reminder_source::{NoReminders, ReminderSource},
    sub_agent::{GENERAL_PURPOSE_AGENT, SubAgentError, SubAgentPort, SubAgentRequest},
    tool_executor::{RegistryError, ToolExecutorPort},
    tool_schema::ToolSchemaPort,
};
pub use use_cases::delegate_task::NestedAgentRunner;
pub use use_cases::run_conversation::{
    ConversationOrchestrator, RunConversationError, TurnOutcome, TurnStop,
};
