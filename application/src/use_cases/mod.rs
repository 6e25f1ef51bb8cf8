//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod delegate_task;
pub mod run_conversation;
