//! Orchestrator session state machine.
//!
//! ```text
//! AwaitingUserInput ──▶ AwaitingCompletion ──▶ DispatchingTools
//!        ▲                 │        ▲                 │
//!        └─────────────────┘        └─────────────────┘
//! any state ──▶ SessionEnded
//! ```

use serde::{Deserialize, Serialize};

use crate::core::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    #[default]
    AwaitingUserInput,
    AwaitingCompletion,
    DispatchingTools,
    SessionEnded,
}

impl OrchestratorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorState::AwaitingUserInput => "awaiting_user_input",
            OrchestratorState::AwaitingCompletion => "awaiting_completion",
            OrchestratorState::DispatchingTools => "dispatching_tools",
            OrchestratorState::SessionEnded => "session_ended",
        }
    }

    pub fn can_transition_to(&self, next: OrchestratorState) -> bool {
        use OrchestratorState::*;
        matches!(
            (self, next),
            (AwaitingUserInput, AwaitingCompletion)
                | (AwaitingCompletion, DispatchingTools)
                | (AwaitingCompletion, AwaitingUserInput)
                | (DispatchingTools, AwaitingCompletion)
                | (DispatchingTools, AwaitingUserInput)
                | (AwaitingUserInput | AwaitingCompletion | DispatchingTools, SessionEnded)
        )
    }

    /// Move to `next`, rejecting transitions the loop never makes.
    pub fn transition(&mut self, next: OrchestratorState) -> Result<(), DomainError> {
        if !self.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.as_str(),
                to: next.as_str(),
            });
        }
        *self = next;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestratorState::SessionEnded)
    }
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
