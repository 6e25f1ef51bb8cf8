//! Infrastructure layer for klaude
//!
//! Adapters for the ports defined in the application layer: the tool set and
//! its registry, the OpenAI-compatible LLM gateway, configuration file loading
//! and the JSONL conversation transcript.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use gateway::OpenAiGateway;
pub use logging::JsonlConversationLogger;
pub use tools::{
    JsonSchemaToolConverter, TodoStore, ToolRegistry, ToolSettings, default_registry,
};
