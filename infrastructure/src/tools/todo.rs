//! TodoWrite tool and the session's todo store.
//!
//! The store is shared between the tool, which replaces the list, and the
//! orchestrator, which reads it back as a reminder on the next user message.

use async_trait::async_trait;
use klaude_application::ReminderSource;
use klaude_domain::{TodoItem, TodoList, Tool, ToolCall, ToolDefinition, ToolError, ToolParameter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Tool name constant
pub const TODO_WRITE: &str = "TodoWrite";

const CONFIRMATION: &str = "Todos have been modified successfully. Ensure that you continue to \
use the todo list to track your progress. Please proceed with the current tasks if applicable";

/// The session's todo list.
#[derive(Debug, Default)]
pub struct TodoStore {
    list: Mutex<TodoList>,
    changed: AtomicBool,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current list.
    pub fn snapshot(&self) -> TodoList {
        match self.list.lock() {
            Ok(list) => list.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the whole list. Invalid input leaves the old list in place.
    pub fn replace(&self, items: Vec<TodoItem>) -> Result<(), ToolError> {
        let mut list = self
            .list
            .lock()
            .map_err(|_| ToolError::execution_failed("Error: todo list is unavailable"))?;
        list.replace(items)
            .map_err(|e| ToolError::invalid_argument(format!("Error: {}", e)))?;
        self.changed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl ReminderSource for TodoStore {
    fn take_reminders(&self) -> Vec<String> {
        if !self.changed.swap(false, Ordering::SeqCst) {
            return Vec::new();
        }
        self.snapshot().reminder().into_iter().collect()
    }
}

pub struct TodoWriteTool {
    definition: ToolDefinition,
    store: Arc<TodoStore>,
}

impl TodoWriteTool {
    pub fn new(store: Arc<TodoStore>) -> Self {
        let definition = ToolDefinition::new(
            TODO_WRITE,
            "Use this tool to create and manage a structured task list for your current coding \
             session. Each call replaces the entire list. Use it for multi-step work, mark a \
             task in_progress before starting it and completed as soon as it is done.",
        )
        .with_parameter(
            ToolParameter::new("todos", "The updated todo list", true)
                .with_type("array")
                .with_items(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "content": {"type": "string", "minLength": 1},
                        "status": {"type": "string", "enum": ["pending", "in_progress", "completed"]},
                        "priority": {"type": "string", "enum": ["high", "medium", "low"]},
                        "id": {"type": "string"}
                    },
                    "required": ["content", "status", "priority", "id"],
                    "additionalProperties": false
                })),
        );
        Self { definition, store }
    }
}

#[async_trait]
impl Tool for TodoWriteTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let raw = call
            .get_array("todos")
            .ok_or_else(|| ToolError::invalid_argument("Error: Argument 'todos' must be an array"))?;
        let items = raw
            .iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value::<TodoItem>(item.clone()).map_err(|e| {
                    ToolError::invalid_argument(format!("Error: Invalid todo {}: {}", i + 1, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = items.len();
        self.store.replace(items)?;
        debug!(count, "Todo list replaced");
        Ok(CONFIRMATION.to_string())
    }
}
