//! Todo list tracked by the model during a session.
//!
//! Every write replaces the whole list; there is no merge.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoPriority {
    High,
    Medium,
    Low,
}

impl TodoPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoPriority::High => "high",
            TodoPriority::Medium => "medium",
            TodoPriority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub content: String,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub id: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    #[error("todo {index} has empty content")]
    EmptyContent { index: usize },

    #[error("todo {index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate todo id '{0}'")]
    DuplicateId(String),
}

/// The current todo list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    items: Vec<TodoItem>,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `items` and replace the whole list with them.
    ///
    /// On error the previous list is kept.
    pub fn replace(&mut self, items: Vec<TodoItem>) -> Result<(), TodoError> {
        let mut ids = HashSet::new();
        for (i, item) in items.iter().enumerate() {
            let index = i + 1;
            if item.content.trim().is_empty() {
                return Err(TodoError::EmptyContent { index });
            }
            if item.id.trim().is_empty() {
                return Err(TodoError::EmptyId { index });
            }
            if !ids.insert(item.id.as_str()) {
                return Err(TodoError::DuplicateId(item.id.clone()));
            }
        }
        self.items = items;
        Ok(())
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count_with_status(&self, status: TodoStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// Reminder text injected into the next user message.
    pub fn reminder(&self) -> Option<String> {
        if self.items.is_empty() {
            return None;
        }
        let json = serde_json::to_string(&self.items).ok()?;
        Some(format!(
            "Your todo list has changed. DO NOT mention this explicitly to the user. \
             Here are the latest contents of your todo list:\n\n{}. \
             Continue on with the tasks at hand if applicable.",
            json
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, content: &str, status: TodoStatus) -> TodoItem {
        TodoItem {
            content: content.to_string(),
            status,
            priority: TodoPriority::Medium,
            id: id.to_string(),
        }
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut list = TodoList::new();
        list.replace(vec![
            item("1", "a", TodoStatus::Pending),
            item("2", "b", TodoStatus::Completed),
        ])
        .unwrap();
        assert_eq!(list.items().len(), 2);

        list.replace(vec![item("3", "c", TodoStatus::InProgress)]).unwrap();
        assert_eq!(list.items().len(), 1);
        assert_eq!(list.items()[0].id, "3");
        assert_eq!(list.count_with_status(TodoStatus::InProgress), 1);
    }

    #[test]
    fn test_invalid_items_keep_previous_list() {
        let mut list = TodoList::new();
        list.replace(vec![item("1", "a", TodoStatus::Pending)]).unwrap();

        let err = list
            .replace(vec![item("2", "  ", TodoStatus::Pending)])
            .unwrap_err();
        assert_eq!(err, TodoError::EmptyContent { index: 1 });
        assert_eq!(list.items()[0].id, "1");

        let err = list
            .replace(vec![
                item("x", "a", TodoStatus::Pending),
                item("x", "b", TodoStatus::Pending),
            ])
            .unwrap_err();
        assert_eq!(err, TodoError::DuplicateId("x".to_string()));
    }

    #[test]
    fn test_serde_wire_names() {
        let parsed: TodoItem = serde_json::from_value(serde_json::json!({
            "content": "write tests",
            "status": "in_progress",
            "priority": "high",
            "id": "t1"
        }))
        .unwrap();
        assert_eq!(parsed.status, TodoStatus::InProgress);
        assert_eq!(parsed.priority, TodoPriority::High);
    }

    #[test]
    fn test_reminder_only_when_non_empty() {
        let mut list = TodoList::new();
        assert!(list.reminder().is_none());
        list.replace(vec![item("1", "a", TodoStatus::Pending)]).unwrap();
        assert!(list.reminder().unwrap().contains("\"status\":\"pending\""));
    }
}
