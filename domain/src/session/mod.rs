//! Conversation session domain.
//!
//! - [`entities::Conversation`]: append-only message log with tool-call bookkeeping
//! - [`entities::Message`]: system / user / assistant / tool messages
//! - [`response::LlmResponse`]: one model turn and its finish signal
//! - [`state::OrchestratorState`]: the per-session state machine

pub mod entities;
pub mod response;
pub mod state;
