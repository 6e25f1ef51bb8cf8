//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod conversation_logger;
pub mod llm_gateway;
pub mod progress;
pub mod reminder_source;
pub mod sub_agent;
pub mod tool_executor;
pub mod tool_schema;
