//! Conversation transcript logging.
//!
//! [`JsonlConversationLogger`] appends one JSON object per
//! [`ConversationEvent`](klaude_application::ConversationEvent) to a file.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;
