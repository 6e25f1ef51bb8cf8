//! Domain layer for klaude
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Tool contract** ([`tool`]): definitions, closed parameter schemas,
//!   decoded calls and normalized results
//! - **Conversation** ([`session`]): the append-only message log, model turns
//!   and the orchestrator state machine
//! - **Edits** ([`edit`]): exact-string substitution and all-or-nothing chains
//! - **Notebooks** ([`notebook`]) and **todos** ([`todo`]): documents the tools
//!   manipulate

pub mod core;
pub mod edit;
pub mod notebook;
pub mod session;
pub mod todo;
pub mod tool;

// Re-export commonly used types
pub use crate::core::error::DomainError;
pub use edit::{ChainError, EditChain, EditError, EditOperation, StepOutcome};
pub use notebook::{CellType, Notebook, NotebookError};
pub use session::{
    entities::{Conversation, Message, Role},
    response::{FinishReason, LlmResponse, ToolInvocationRequest},
    state::OrchestratorState,
};
pub use todo::{TodoError, TodoItem, TodoList, TodoPriority, TodoStatus};
pub use tool::{
    DefaultToolValidator, Tool, ToolCall, ToolDefinition, ToolError, ToolParameter, ToolResult,
    ToolResultMetadata, ToolValidator,
};
