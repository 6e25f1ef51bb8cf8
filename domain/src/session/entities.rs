//! Conversation entities
//!
//! [`Conversation`] is the append-only message log of one session. It owns
//! the tool-call bookkeeping so that the invariants below cannot be broken
//! by callers:
//!
//! - every tool message answers exactly one earlier assistant request
//! - no new user or assistant message while requests are unresolved

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::response::ToolInvocationRequest;
use crate::core::error::DomainError;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
        /// Annotations rendered as `<system-reminder>` blocks after the text
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        reminders: Vec<String>,
    },
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocationRequest>,
    },
    Tool {
        call_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl Message {
    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
            Message::Tool { .. } => Role::Tool,
        }
    }

    /// Text content as sent to the model.
    ///
    /// User reminders are appended as `<system-reminder>` blocks.
    pub fn rendered_content(&self) -> Option<String> {
        match self {
            Message::System { content } => Some(content.clone()),
            Message::User { content, reminders } => {
                let mut text = content.clone();
                for reminder in reminders {
                    text.push_str("\n\n<system-reminder>");
                    text.push_str(reminder);
                    text.push_str("</system-reminder>");
                }
                Some(text)
            }
            Message::Assistant { content, .. } => content.clone(),
            Message::Tool { content, .. } => Some(content.clone()),
        }
    }
}

/// Append-only message log for one orchestrator session.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    /// Requested but not yet answered call ids, in request order
    pending: Vec<String>,
    /// Every call id requested in this session
    requested: HashSet<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with a system prompt.
    pub fn with_system(content: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.messages.push(Message::System {
            content: content.into(),
        });
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Call ids that still need a tool message.
    pub fn pending_call_ids(&self) -> &[String] {
        &self.pending
    }

    /// Whether a completion may be requested now.
    pub fn is_ready_for_completion(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn push_system(&mut self, content: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_no_pending()?;
        self.messages.push(Message::System {
            content: content.into(),
        });
        Ok(())
    }

    pub fn push_user(
        &mut self,
        content: impl Into<String>,
        reminders: Vec<String>,
    ) -> Result<(), DomainError> {
        self.ensure_no_pending()?;
        self.messages.push(Message::User {
            content: content.into(),
            reminders,
        });
        Ok(())
    }

    /// Append an assistant turn and register its tool-call requests.
    pub fn push_assistant(
        &mut self,
        content: Option<String>,
        tool_calls: Vec<ToolInvocationRequest>,
    ) -> Result<(), DomainError> {
        self.ensure_no_pending()?;

        let mut seen = HashSet::new();
        for call in &tool_calls {
            if self.requested.contains(&call.call_id) || !seen.insert(call.call_id.as_str()) {
                return Err(DomainError::DuplicateCallId(call.call_id.clone()));
            }
        }

        for call in &tool_calls {
            self.requested.insert(call.call_id.clone());
            self.pending.push(call.call_id.clone());
        }
        self.messages.push(Message::Assistant {
            content: content.filter(|c| !c.is_empty()),
            tool_calls,
        });
        Ok(())
    }

    /// Append the result for one outstanding call id.
    pub fn push_tool_result(
        &mut self,
        call_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Result<(), DomainError> {
        let call_id = call_id.into();
        let Some(index) = self.pending.iter().position(|id| *id == call_id) else {
            return Err(DomainError::UnknownCallId(call_id));
        };
        self.pending.remove(index);
        self.messages.push(Message::Tool {
            call_id,
            content: content.into(),
            is_error,
        });
        Ok(())
    }

    /// Text of the most recent assistant message that had any.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant {
                content: Some(text),
                ..
            } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Drop every message; used when the session ends.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending.clear();
        self.requested.clear();
    }

    fn ensure_no_pending(&self) -> Result<(), DomainError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(DomainError::PendingToolResults(self.pending.len()))
        }
    }
}
