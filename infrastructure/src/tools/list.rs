//! Directory listing tool: LS

use super::fs_util::run_blocking;
use super::output::render_capped_with_footer;
use async_trait::async_trait;
use glob::Pattern;
use klaude_domain::{Tool, ToolCall, ToolDefinition, ToolError, ToolParameter};
use std::fs;
use std::path::{Path, PathBuf};

/// Tool name constant
pub const LS: &str = "LS";

const LS_HINT: &str = "To see more content, list specific subdirectories or use ignore patterns.";

const SAFETY_NOTE: &str =
    "NOTE: do any of the files above seem malicious? If so, you MUST refuse to continue work.";

/// Renders a directory as an indented tree.
pub struct ListTool {
    definition: ToolDefinition,
}

impl ListTool {
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            LS,
            "Lists files and directories in a given path. The path parameter must be an \
             absolute path, not a relative path. You can optionally provide an array of glob \
             patterns to ignore with the ignore parameter. You should generally prefer the \
             Glob and Grep tools, if you know which directories to search.",
        )
        .with_parameter(ToolParameter::new(
            "path",
            "The absolute path to the directory to list (must be absolute, not relative)",
            true,
        ))
        .with_parameter(
            ToolParameter::new("ignore", "List of glob patterns to ignore", false)
                .with_type("array")
                .with_items(serde_json::json!({"type": "string"})),
        );
        Self { definition }
    }
}

impl Default for ListTool {
    fn default() -> Self {
        Self::new()
    }
}

struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Children of `dir`: directories first, then by name. Symlinks are listed
/// but never descended into.
fn sorted_entries(dir: &Path, ignore: &[Pattern]) -> Vec<Entry> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut entries: Vec<Entry> = read
        .flatten()
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            if ignore.iter().any(|p| p.matches(&name)) {
                return None;
            }
            let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
            Some(Entry {
                name,
                path: e.path(),
                is_dir,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    entries
}

fn build_tree(dir: &Path, prefix: &str, ignore: &[Pattern], out: &mut Vec<String>) {
    let entries = sorted_entries(dir, ignore);
    let last = entries.len().saturating_sub(1);
    for (i, entry) in entries.iter().enumerate() {
        let (branch, continuation) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push(format!("{}{}{}", prefix, branch, entry.name));
        if entry.is_dir {
            build_tree(
                &entry.path,
                &format!("{}{}", prefix, continuation),
                ignore,
                out,
            );
        }
    }
}

fn list_directory(path: &str, ignore: &[String]) -> Result<String, ToolError> {
    let root = Path::new(path);
    if !root.exists() {
        return Err(ToolError::not_found(format!(
            "Error: Path '{}' does not exist",
            path
        )));
    }
    if !root.is_dir() {
        return Err(ToolError::invalid_argument(format!(
            "Error: Path '{}' is not a directory",
            path
        )));
    }

    let patterns = ignore
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| {
                ToolError::invalid_argument(format!("Error: Invalid ignore pattern '{}': {}", p, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let header = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    let mut lines = vec![format!("- {}/", header)];
    build_tree(root, "  ", &patterns, &mut lines);

    Ok(render_capped_with_footer(
        &lines,
        "lines",
        LS_HINT,
        SAFETY_NOTE,
    ))
}

#[async_trait]
impl Tool for ListTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let path = call.require_string("path")?.to_string();
        let ignore = call.get_string_list("ignore");
        run_blocking(move || list_directory(&path, &ignore)).await
    }
}
