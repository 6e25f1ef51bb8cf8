//! Tool domain module
//!
//! The contract every tool exposes to the orchestrator and to the model.
//!
//! ```text
//! ┌────────────────┐   schema    ┌──────────────┐
//! │ ToolDefinition │───────────▶ │ LLM context  │
//! └───────┬────────┘             └──────┬───────┘
//!         │                             │ raw JSON arguments
//!         ▼                             ▼
//! ┌────────────────┐  validate   ┌──────────────┐  execute  ┌────────────┐
//! │ ToolValidator  │◀────────────│ ToolCall     │──────────▶│ ToolResult │
//! └────────────────┘             └──────────────┘           └────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ToolDefinition`]: name, description and parameters; renders the closed
//!   draft-07 object schema via [`ToolDefinition::parameters_schema`]
//! - [`ToolCall`]: decoded invocation with typed argument accessors
//! - [`Tool`]: async capability interface implemented by each tool
//! - [`ToolError`] / [`ToolResult`]: normalized execution outcome
//!
//! This module is pure: no I/O, no processes, no network. Concrete tools
//! live in the infrastructure crate.

pub mod entities;
pub mod traits;
pub mod value_objects;

pub use entities::{JSON_SCHEMA_DIALECT, ToolCall, ToolDefinition, ToolParameter};
pub use traits::{DefaultToolValidator, Tool, ToolValidator};
pub use value_objects::{ToolError, ToolResult, ToolResultMetadata};
