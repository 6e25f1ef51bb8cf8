//! Editing tools: Edit, MultiEdit
//!
//! Both delegate the string work to the domain edit engine and persist the
//! result with a single atomic write.

use super::fs_util::{read_optional, write_atomic};
use async_trait::async_trait;
use klaude_domain::edit::{apply_edit, numbered_snippet};
use klaude_domain::{
    ChainError, EditChain, EditError, EditOperation, Tool, ToolCall, ToolDefinition, ToolError,
    ToolParameter,
};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Tool name constants
pub const EDIT: &str = "Edit";
pub const MULTI_EDIT: &str = "MultiEdit";

/// Lines of context around the first change in the Edit snippet
const SNIPPET_CONTEXT: usize = 3;

fn edit_error(error: EditError) -> ToolError {
    ToolError::invalid_argument(format!("Error: {}", error))
}

fn missing_file(path: &str) -> ToolError {
    ToolError::not_found(format!("Error: File '{}' does not exist", path))
}

/// Exact-string replacement in one file.
pub struct EditTool {
    definition: ToolDefinition,
}

impl EditTool {
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            EDIT,
            "Performs exact string replacements in files. The edit fails if old_string is not \
             unique in the file; give more surrounding context or set replace_all to change \
             every instance. Preserve the exact indentation shown after the Read line-number \
             prefix.",
        )
        .with_parameter(ToolParameter::new(
            "file_path",
            "The absolute path to the file to modify",
            true,
        ))
        .with_parameter(ToolParameter::new("old_string", "The text to replace", true))
        .with_parameter(ToolParameter::new(
            "new_string",
            "The text to replace it with (must be different from old_string)",
            true,
        ))
        .with_parameter(
            ToolParameter::new(
                "replace_all",
                "Replace all occurences of old_string (default false)",
                false,
            )
            .with_type("boolean")
            .with_default(false),
        );
        Self { definition }
    }
}

impl Default for EditTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for EditTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let file_path = call.require_string("file_path")?;
        let op = EditOperation {
            old_string: call.require_string("old_string")?.to_string(),
            new_string: call.require_string("new_string")?.to_string(),
            replace_all: call.get_bool("replace_all").unwrap_or(false),
        };

        let path = Path::new(file_path);
        let content = fs::read_to_string(path).map_err(|e| ToolError::from_io(&e, file_path))?;

        let replacement = apply_edit(&content, &op).map_err(edit_error)?;
        write_atomic(path, &replacement.content).map_err(|e| ToolError::from_io(&e, file_path))?;
        debug!(path = %file_path, count = replacement.count, "Edited file");

        let snippet = numbered_snippet(
            &replacement.content,
            replacement.first_changed_line(),
            SNIPPET_CONTEXT,
        );
        Ok(format!(
            "The file {} has been updated. Here's the result of running `cat -n` on a snippet of the edited file:\n{}",
            file_path, snippet
        ))
    }
}

/// Ordered, all-or-nothing batch of edits to one file.
pub struct MultiEditTool {
    definition: ToolDefinition,
}

impl MultiEditTool {
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            MULTI_EDIT,
            "Makes multiple find-and-replace edits to a single file in one operation. Edits are \
             applied in order, each to the result of the previous one, and either all succeed \
             or none are applied. To create a file, make the first edit's old_string empty \
             with the file's contents as new_string.",
        )
        .with_parameter(ToolParameter::new(
            "file_path",
            "The absolute path to the file to modify",
            true,
        ))
        .with_parameter(
            ToolParameter::new(
                "edits",
                "Array of edit operations to perform sequentially on the file",
                true,
            )
            .with_type("array")
            .with_items(serde_json::json!({
                "type": "object",
                "properties": {
                    "old_string": {"type": "string", "description": "The text to replace"},
                    "new_string": {"type": "string", "description": "The text to replace it with"},
                    "replace_all": {
                        "type": "boolean",
                        "default": false,
                        "description": "Replace all occurences of old_string (default false)."
                    }
                },
                "required": ["old_string", "new_string"],
                "additionalProperties": false
            }))
            .with_constraint("minItems", 1),
        );
        Self { definition }
    }
}

impl Default for MultiEditTool {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_edits(call: &ToolCall) -> Result<Vec<EditOperation>, ToolError> {
    let Some(items) = call.get_array("edits") else {
        return Err(ToolError::invalid_argument(
            "Error: Argument 'edits' must be an array",
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<EditOperation>(item.clone()).map_err(|e| {
                ToolError::invalid_argument(format!("Error: In edit {}, {}", i + 1, e))
            })
        })
        .collect()
}

#[async_trait]
impl Tool for MultiEditTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let file_path = call.require_string("file_path")?;
        let chain = EditChain::new(parse_edits(call)?).map_err(edit_error)?;

        let path = Path::new(file_path);
        let original = read_optional(path).map_err(|e| ToolError::from_io(&e, file_path))?;

        // Phase 1: prove the whole chain against an immutable copy.
        let validated = chain.validate(original.as_deref()).map_err(|e| match e {
            ChainError {
                error: EditError::MissingFile,
                ..
            } => missing_file(file_path),
            other => ToolError::invalid_argument(format!("Error: {}", other)),
        })?;

        // Phase 2: one write of the final content.
        let summary = validated.summary_lines();
        let content = validated.apply();
        write_atomic(path, &content).map_err(|e| ToolError::from_io(&e, file_path))?;
        debug!(path = %file_path, edits = chain.edits().len(), "Applied edit chain");

        Ok(format!(
            "Applied {} edit(s) to {}:\n{}",
            chain.edits().len(),
            file_path,
            summary.join("\n")
        ))
    }
}
