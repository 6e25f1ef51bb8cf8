//! Jupyter notebook tools: NotebookRead, NotebookEdit

use super::fs_util::write_atomic;
use super::output::render_capped;
use async_trait::async_trait;
use klaude_domain::{
    CellType, Notebook, NotebookError, Tool, ToolCall, ToolDefinition, ToolError, ToolParameter,
};
use std::fs;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

/// Tool name constants
pub const NOTEBOOK_READ: &str = "NotebookRead";
pub const NOTEBOOK_EDIT: &str = "NotebookEdit";

const READ_HINT: &str = "Pass cell_id to read a single cell.";

fn notebook_error(error: NotebookError) -> ToolError {
    match error {
        NotebookError::CellNotFound(_) => ToolError::not_found(format!("Error: {}", error)),
        NotebookError::Serialize(_) => ToolError::execution_failed(format!("Error: {}", error)),
        _ => ToolError::invalid_argument(format!("Error: {}", error)),
    }
}

fn load(notebook_path: &str) -> Result<Notebook, ToolError> {
    let path = Path::new(notebook_path);
    if !path.exists() {
        return Err(ToolError::not_found(format!(
            "Error: Notebook '{}' does not exist",
            notebook_path
        )));
    }
    let text = fs::read_to_string(path).map_err(|e| ToolError::from_io(&e, notebook_path))?;
    Notebook::parse(&text).map_err(notebook_error)
}

/// Renders notebook cells with their text outputs.
pub struct NotebookReadTool {
    definition: ToolDefinition,
}

impl NotebookReadTool {
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            NOTEBOOK_READ,
            "Reads a Jupyter notebook (.ipynb file) and returns all of the cells with their \
             outputs. The notebook_path parameter must be an absolute path, not a relative path.",
        )
        .with_parameter(ToolParameter::new(
            "notebook_path",
            "The absolute path to the Jupyter notebook file to read (must be absolute, not relative)",
            true,
        ))
        .with_parameter(ToolParameter::new(
            "cell_id",
            "The ID of a specific cell to read. If not provided, all cells will be read.",
            false,
        ));
        Self { definition }
    }
}

impl Default for NotebookReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for NotebookReadTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let notebook_path = call.require_string("notebook_path")?;
        let notebook = load(notebook_path)?;
        let rendered = notebook
            .render(call.get_string("cell_id"))
            .map_err(notebook_error)?;
        let lines: Vec<&str> = rendered.split('\n').collect();
        Ok(render_capped(&lines, "lines", READ_HINT))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditMode {
    Replace,
    Insert,
    Delete,
}

impl EditMode {
    fn parse(s: Option<&str>) -> Result<Self, ToolError> {
        match s {
            None | Some("replace") => Ok(EditMode::Replace),
            Some("insert") => Ok(EditMode::Insert),
            Some("delete") => Ok(EditMode::Delete),
            Some(other) => Err(ToolError::invalid_argument(format!(
                "Error: Invalid edit_mode '{}'. Expected replace, insert or delete",
                other
            ))),
        }
    }
}

/// Replaces, inserts or deletes one notebook cell.
pub struct NotebookEditTool {
    definition: ToolDefinition,
}

impl NotebookEditTool {
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            NOTEBOOK_EDIT,
            "Completely replaces the contents of a specific cell in a Jupyter notebook (.ipynb \
             file) with new source. Use edit_mode=insert to add a new cell after the cell with \
             cell_id (or at the beginning), and edit_mode=delete to remove the cell with cell_id.",
        )
        .with_parameter(ToolParameter::new(
            "notebook_path",
            "The absolute path to the Jupyter notebook file to edit (must be absolute, not relative)",
            true,
        ))
        .with_parameter(ToolParameter::new(
            "cell_id",
            "The ID of the cell to edit. When inserting a new cell, the new cell will be inserted \
             after the cell with this ID, or at the beginning if not specified.",
            false,
        ))
        .with_parameter(ToolParameter::new(
            "new_source",
            "The new source for the cell",
            true,
        ))
        .with_parameter(
            ToolParameter::new(
                "cell_type",
                "The type of the cell (code or markdown). If not specified, it defaults to the \
                 current cell type. Inserted cells default to code.",
                false,
            )
            .with_enum(["code", "markdown"]),
        )
        .with_parameter(
            ToolParameter::new(
                "edit_mode",
                "The type of edit to make (replace, insert, delete). Defaults to replace.",
                false,
            )
            .with_enum(["replace", "insert", "delete"]),
        );
        Self { definition }
    }
}

impl Default for NotebookEditTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for NotebookEditTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let notebook_path = call.require_string("notebook_path")?;
        let new_source = call.require_string("new_source")?;
        let cell_id = call.get_string("cell_id");
        let mode = EditMode::parse(call.get_string("edit_mode"))?;
        let cell_type = call
            .get_string("cell_type")
            .map(str::parse::<CellType>)
            .transpose()
            .map_err(|e| ToolError::invalid_argument(format!("Error: {}", e)))?;

        let mut notebook = load(notebook_path)?;
        match mode {
            EditMode::Replace => notebook.replace_cell(cell_id, new_source, cell_type),
            EditMode::Insert => notebook
                .insert_cell(
                    cell_id,
                    Uuid::new_v4().simple().to_string(),
                    new_source,
                    cell_type.unwrap_or(CellType::Code),
                )
                .map(|_| ()),
            EditMode::Delete => notebook.delete_cell(cell_id),
        }
        .map_err(notebook_error)?;

        let text = notebook.to_json_string().map_err(notebook_error)?;
        write_atomic(Path::new(notebook_path), &text)
            .map_err(|e| ToolError::from_io(&e, notebook_path))?;
        debug!(path = %notebook_path, mode = ?mode, "Notebook updated");

        Ok(format!("Notebook {} updated successfully", notebook_path))
    }
}
