//! Jupyter notebook document model.
//!
//! The document is kept as raw JSON so unknown fields (kernel metadata,
//! attachments, widget state) survive an edit untouched. Only the `cells`
//! array is interpreted.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotebookError {
    #[error("Invalid notebook JSON: {0}")]
    Parse(String),

    #[error("Invalid notebook: missing 'cells' array")]
    MissingCells,

    #[error("Cell with id '{0}' not found")]
    CellNotFound(String),

    #[error("cell_id is required for {0} mode")]
    MissingCellId(&'static str),

    #[error("Failed to serialize notebook: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    Code,
    Markdown,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Code => "code",
            CellType::Markdown => "markdown",
        }
    }
}

impl std::str::FromStr for CellType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(CellType::Code),
            "markdown" => Ok(CellType::Markdown),
            other => Err(format!(
                "Invalid cell_type '{}'. Expected 'code' or 'markdown'",
                other
            )),
        }
    }
}

/// A parsed `.ipynb` document.
#[derive(Debug, Clone)]
pub struct Notebook {
    /// Every top-level field except `cells`
    doc: Map<String, Value>,
    cells: Vec<Value>,
}

impl Notebook {
    pub fn parse(text: &str) -> Result<Self, NotebookError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| NotebookError::Parse(e.to_string()))?;
        let Value::Object(mut doc) = value else {
            return Err(NotebookError::Parse("top level is not an object".to_string()));
        };
        let cells = match doc.remove("cells") {
            Some(Value::Array(cells)) => cells,
            None => Vec::new(),
            Some(_) => return Err(NotebookError::MissingCells),
        };
        Ok(Self { doc, cells })
    }

    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    /// Index of the cell whose `id` or `metadata.id` equals `cell_id`.
    pub fn find_cell(&self, cell_id: &str) -> Option<usize> {
        self.cells().iter().position(|cell| cell_matches(cell, cell_id))
    }

    /// Render every cell, or only the one with `cell_id`.
    pub fn render(&self, cell_id: Option<&str>) -> Result<String, NotebookError> {
        if let Some(id) = cell_id {
            let index = self
                .find_cell(id)
                .ok_or_else(|| NotebookError::CellNotFound(id.to_string()))?;
            return Ok(format_cell(&self.cells()[index]));
        }

        let mut parts = Vec::new();
        for (i, cell) in self.cells().iter().enumerate() {
            parts.push(format!("Cell {} [{}]:", i, cell_type_of(cell)));
            parts.push(format_cell(cell));
            parts.push(String::new());
        }
        Ok(parts.join("\n"))
    }

    /// Overwrite a cell's source and, optionally, its type.
    pub fn replace_cell(
        &mut self,
        cell_id: Option<&str>,
        source: &str,
        cell_type: Option<CellType>,
    ) -> Result<(), NotebookError> {
        let id = cell_id.ok_or(NotebookError::MissingCellId("replace"))?;
        let index = self
            .find_cell(id)
            .ok_or_else(|| NotebookError::CellNotFound(id.to_string()))?;
        if let Some(Value::Object(cell)) = self.cells.get_mut(index) {
            cell.insert("source".to_string(), source_lines(source));
            if let Some(cell_type) = cell_type {
                set_cell_type(cell, cell_type);
            }
        }
        Ok(())
    }

    /// Insert a new cell after `after_id`, or at the head when `None`.
    pub fn insert_cell(
        &mut self,
        after_id: Option<&str>,
        new_id: String,
        source: &str,
        cell_type: CellType,
    ) -> Result<usize, NotebookError> {
        let position = match after_id {
            Some(id) => {
                self.find_cell(id)
                    .ok_or_else(|| NotebookError::CellNotFound(id.to_string()))?
                    + 1
            }
            None => 0,
        };

        let mut cell = Map::new();
        cell.insert("id".to_string(), Value::String(new_id));
        cell.insert("metadata".to_string(), Value::Object(Map::new()));
        cell.insert("source".to_string(), source_lines(source));
        set_cell_type(&mut cell, cell_type);

        self.cells.insert(position, Value::Object(cell));
        Ok(position)
    }

    pub fn delete_cell(&mut self, cell_id: Option<&str>) -> Result<(), NotebookError> {
        let id = cell_id.ok_or(NotebookError::MissingCellId("delete"))?;
        let index = self
            .find_cell(id)
            .ok_or_else(|| NotebookError::CellNotFound(id.to_string()))?;
        self.cells.remove(index);
        Ok(())
    }

    /// Serialize with one-space indentation, the layout Jupyter writes.
    pub fn to_json_string(&self) -> Result<String, NotebookError> {
        let mut doc = self.doc.clone();
        doc.insert("cells".to_string(), Value::Array(self.cells.clone()));

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        doc.serialize(&mut serializer)
            .map_err(|e| NotebookError::Serialize(e.to_string()))?;
        let mut text =
            String::from_utf8(buf).map_err(|e| NotebookError::Serialize(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }
}

fn cell_matches(cell: &Value, cell_id: &str) -> bool {
    cell.get("id").and_then(Value::as_str) == Some(cell_id)
        || cell
            .get("metadata")
            .and_then(|m| m.get("id"))
            .and_then(Value::as_str)
            == Some(cell_id)
}

fn cell_type_of(cell: &Value) -> &str {
    cell.get("cell_type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}

fn set_cell_type(cell: &mut Map<String, Value>, cell_type: CellType) {
    cell.insert(
        "cell_type".to_string(),
        Value::String(cell_type.as_str().to_string()),
    );
    match cell_type {
        CellType::Code => {
            cell.entry("outputs").or_insert_with(|| Value::Array(Vec::new()));
            cell.entry("execution_count").or_insert(Value::Null);
        }
        CellType::Markdown => {
            cell.remove("outputs");
            cell.remove("execution_count");
        }
    }
}

/// Split source into lines keeping their terminators, as nbformat stores it.
fn source_lines(source: &str) -> Value {
    Value::Array(
        source
            .split_inclusive('\n')
            .map(|line| Value::String(line.to_string()))
            .collect(),
    )
}

/// Join a string-or-list field.
fn joined_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

fn format_cell(cell: &Value) -> String {
    let cell_type = cell_type_of(cell);
    let source = cell.get("source").map(joined_text).unwrap_or_default();

    let mut result = format!("Type: {}\nSource:\n{}\n", cell_type, source);

    if cell_type == "code"
        && let Some(Value::Array(outputs)) = cell.get("outputs")
    {
        result.push_str("Outputs:\n");
        for output in outputs {
            if let Some(text) = output.get("text") {
                result.push_str(&joined_text(text));
            } else if let Some(plain) = output.get("data").and_then(|d| d.get("text/plain")) {
                result.push_str(&joined_text(plain));
            }
        }
    }
    result
}
