//! Console formatting for conversation activity
//!
//! Pure string builders; [`ConsoleProgress`](crate::ConsoleProgress) decides
//! when and where they are printed.

use colored::Colorize;
use klaude_domain::core::string::preview;
use klaude_domain::{ToolInvocationRequest, ToolResult};
use serde_json::Value;

/// Lines of tool output shown under a result marker
const RESULT_PREVIEW_LINES: usize = 3;
const ARGUMENT_PREVIEW_CHARS: usize = 80;

/// Formats conversation events for terminal display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// One line announcing a tool call.
    ///
    /// Bash calls show the command itself as `$ command`; everything else is
    /// `● Tool(main argument)`.
    pub fn tool_invocation(request: &ToolInvocationRequest) -> String {
        let args: Value = serde_json::from_str(&request.arguments).unwrap_or(Value::Null);

        if request.tool_name == "Bash"
            && let Some(command) = args.get("command").and_then(Value::as_str)
        {
            return format!("{} {}", "$".green().bold(), command);
        }

        let summary = Self::argument_summary(&request.tool_name, &args);
        if summary.is_empty() {
            format!("{} {}", "●".cyan(), request.tool_name.bold())
        } else {
            format!("{} {}({})", "●".cyan(), request.tool_name.bold(), summary)
        }
    }

    /// Result marker plus the first lines of output, or the error message.
    pub fn tool_result(result: &ToolResult) -> String {
        let content = result.content();
        if !result.is_success() {
            return format!("  {} {}", "⎿".red(), preview(content, 200).red());
        }

        let lines: Vec<&str> = content.lines().collect();
        let mut out = String::new();
        for (i, line) in lines.iter().take(RESULT_PREVIEW_LINES).enumerate() {
            let marker = if i == 0 { "⎿" } else { " " };
            out.push_str(&format!("  {} {}\n", marker.dimmed(), preview(line, 120)));
        }
        if lines.len() > RESULT_PREVIEW_LINES {
            out.push_str(&format!(
                "    {}\n",
                format!("… +{} lines", lines.len() - RESULT_PREVIEW_LINES).dimmed()
            ));
        }
        if out.is_empty() {
            out.push_str(&format!("  {} {}\n", "⎿".dimmed(), "(no output)".dimmed()));
        }
        out.trim_end_matches('\n').to_string()
    }

    pub fn warning(message: &str) -> String {
        format!("{} {}", "warning:".yellow().bold(), message)
    }

    pub fn error(message: &str) -> String {
        format!("{} {}", "error:".red().bold(), message)
    }

    fn argument_summary(tool: &str, args: &Value) -> String {
        let key = match tool {
            "Read" | "Write" | "Edit" | "MultiEdit" => "file_path",
            "NotebookRead" | "NotebookEdit" => "notebook_path",
            "Glob" | "Grep" => "pattern",
            "LS" => "path",
            "WebFetch" => "url",
            "WebSearch" => "query",
            "Task" => "description",
            "TodoWrite" => {
                let count = args
                    .get("todos")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                return format!("{} items", count);
            }
            _ => "",
        };

        let value = args.get(key).and_then(Value::as_str).or_else(|| {
            args.as_object()
                .and_then(|map| map.values().find_map(Value::as_str))
        });
        value
            .map(|v| preview(v, ARGUMENT_PREVIEW_CHARS))
            .unwrap_or_default()
    }
}
