//! Presentation layer for klaude
//!
//! This crate contains the CLI definition, console rendering of conversation
//! activity, and the interactive REPL.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
pub use progress::reporter::ConsoleProgress;
