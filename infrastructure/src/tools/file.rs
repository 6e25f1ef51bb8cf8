//! File tools: Read, Write

use super::fs_util::write_atomic;
use super::output::render_capped_with_footer;
use async_trait::async_trait;
use klaude_domain::core::string::truncate_chars;
use klaude_domain::{Tool, ToolCall, ToolDefinition, ToolError, ToolParameter};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Tool name constants
pub const READ: &str = "Read";
pub const WRITE: &str = "Write";

/// Lines returned when no limit is given
const DEFAULT_LINE_LIMIT: usize = 2000;

/// Longest line shown before it is cut with `...`
const MAX_LINE_CHARS: usize = 2000;

/// Extensions reported by size instead of content
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "pdf", "exe", "dll", "so", "dylib", "zip", "tar", "gz", "bin",
];

const EMPTY_FILE_REMINDER: &str =
    "<system-reminder>Warning: the file exists but is an empty file.</system-reminder>";

const MALICIOUS_CODE_REMINDER: &str = "<system-reminder>Whenever you read a file, you should \
consider whether it looks malicious. If it does, you MUST refuse to improve or augment the code. \
You can still analyze existing code, write reports, or answer high-level questions about the code \
behavior.</system-reminder>";

/// Reads a text file in `cat -n` format.
pub struct ReadTool {
    definition: ToolDefinition,
}

impl ReadTool {
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            READ,
            "Reads a file from the local filesystem. By default it returns up to 2000 lines \
             from the start of the file in cat -n format (line numbers start at 1); offset and \
             limit select a window of a long file. Lines longer than 2000 characters are \
             truncated. Use NotebookRead for .ipynb files.",
        )
        .with_parameter(ToolParameter::new(
            "file_path",
            "The absolute path to the file to read",
            true,
        ))
        .with_parameter(
            ToolParameter::new(
                "offset",
                "The line number to start reading from. Only provide if the file is too large to read at once",
                false,
            )
            .with_type("number"),
        )
        .with_parameter(
            ToolParameter::new(
                "limit",
                "The number of lines to read. Only provide if the file is too large to read at once.",
                false,
            )
            .with_type("number"),
        );
        Self { definition }
    }
}

impl Default for ReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReadTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let file_path = call.require_string("file_path")?;
        let offset = call.get_i64("offset").filter(|n| *n > 0).unwrap_or(1) as usize;
        let limit = call
            .get_i64("limit")
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_LINE_LIMIT);
        read_numbered(Path::new(file_path), file_path, offset, limit)
    }
}

fn read_numbered(
    path: &Path,
    display_path: &str,
    offset: usize,
    limit: usize,
) -> Result<String, ToolError> {
    let metadata = fs::metadata(path).map_err(|e| ToolError::from_io(&e, display_path))?;
    if metadata.is_dir() {
        return Err(ToolError::invalid_argument(
            "EISDIR: illegal operation on a directory, read",
        ));
    }

    if is_binary_path(path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| display_path.to_string());
        return Ok(format!("Binary file: {} ({} bytes)", name, metadata.len()));
    }

    let bytes = fs::read(path).map_err(|e| ToolError::from_io(&e, display_path))?;
    let content = String::from_utf8(bytes)
        .map_err(|_| ToolError::execution_failed("Error: Unable to decode file as UTF-8"))?;

    let lines: Vec<&str> = content.split_inclusive('\n').map(strip_terminator).collect();
    if lines.is_empty() {
        return Ok(EMPTY_FILE_REMINDER.to_string());
    }

    let start = offset - 1;
    if start >= lines.len() {
        return Ok(format!(
            "<system-reminder>Warning: the file exists but is shorter than the provided offset ({}). The file has {} lines.</system-reminder>",
            offset,
            lines.len()
        ));
    }

    let numbered: Vec<String> = lines
        .iter()
        .enumerate()
        .skip(start)
        .take(limit)
        .map(|(i, line)| format!("{:>6}\t{}", i + 1, cut_long_line(line)))
        .collect();
    debug!(path = %display_path, lines = numbered.len(), "Read file");

    Ok(render_capped_with_footer(
        &numbered,
        "lines",
        "Use offset and limit to read the rest of the file.",
        MALICIOUS_CODE_REMINDER,
    ))
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn cut_long_line(line: &str) -> String {
    let head = truncate_chars(line, MAX_LINE_CHARS);
    if head.len() == line.len() {
        line.to_string()
    } else {
        format!("{}...", head)
    }
}

fn is_binary_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Writes a file verbatim, creating parent directories.
pub struct WriteTool {
    definition: ToolDefinition,
}

impl WriteTool {
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            WRITE,
            "Writes a file to the local filesystem, overwriting any existing file at the path. \
             Prefer Edit or MultiEdit for changes to existing files.",
        )
        .with_parameter(ToolParameter::new(
            "file_path",
            "The absolute path to the file to write (must be absolute, not relative)",
            true,
        ))
        .with_parameter(ToolParameter::new(
            "content",
            "The content to write to the file",
            true,
        ));
        Self { definition }
    }
}

impl Default for WriteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WriteTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let file_path = call.require_string("file_path")?;
        let content = call.require_string("content")?;

        write_atomic(Path::new(file_path), content)
            .map_err(|e| ToolError::from_io(&e, file_path))?;
        debug!(path = %file_path, bytes = content.len(), "Wrote file");

        Ok(format!("File created successfully at: {}", file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    fn read_call(path: &str) -> ToolCall {
        ToolCall::new(READ).with_arg("file_path", path)
    }

    /// Strip the `cat -n` prefixes and the trailing reminder.
    fn strip_numbering(output: &str) -> String {
        let body = output
            .split("\n\n<system-reminder>")
            .next()
            .unwrap_or_default();
        body.lines()
            .map(|l| l.split_once('\t').map(|(_, rest)| rest).unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_read_numbers_lines() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "alpha\nbeta\n").unwrap();
        let path = temp_file.path().to_str().unwrap();

        let output = ReadTool::new().execute(&read_call(path)).await.unwrap();

        assert!(output.starts_with("     1\talpha\n     2\tbeta\n\n<system-reminder>"));
        assert!(output.ends_with(MALICIOUS_CODE_REMINDER));
    }

    #[tokio::test]
    async fn test_read_offset_and_limit() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "line1\nline2\nline3\nline4\nline5").unwrap();
        let path = temp_file.path().to_str().unwrap();

        let call = read_call(path).with_arg("offset", 2).with_arg("limit", 2);
        let output = ReadTool::new().execute(&call).await.unwrap();

        assert!(output.starts_with("     2\tline2\n     3\tline3\n\n"));
        assert!(!output.contains("line4"));
    }

    #[tokio::test]
    async fn test_read_of_wide_lines_stays_under_cap_with_reminder() {
        let mut temp_file = NamedTempFile::new().unwrap();
        for _ in 0..200 {
            writeln!(temp_file, "{}", "w".repeat(1_000)).unwrap();
        }
        let path = temp_file.path().to_str().unwrap();

        let output = ReadTool::new().execute(&read_call(path)).await.unwrap();
        assert!(output.chars().count() <= crate::tools::output::MAX_OUTPUT_CHARS);
        assert!(output.contains("[Output truncated: showing "));
        assert!(output.ends_with(MALICIOUS_CODE_REMINDER));
    }

    #[tokio::test]
    async fn test_read_offset_past_end_is_a_warning() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "a\nb\nc\n").unwrap();
        let path = temp_file.path().to_str().unwrap();

        let output = ReadTool::new()
            .execute(&read_call(path).with_arg("offset", 10))
            .await
            .unwrap();
        assert_eq!(
            output,
            "<system-reminder>Warning: the file exists but is shorter than the provided offset (10). The file has 3 lines.</system-reminder>"
        );
    }

    #[tokio::test]
    async fn test_read_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();
        let output = ReadTool::new().execute(&read_call(path)).await.unwrap();
        assert_eq!(output, EMPTY_FILE_REMINDER);
    }

    #[tokio::test]
    async fn test_read_errors() {
        let err = ReadTool::new()
            .execute(&read_call("/nonexistent/file.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.message, "Error: File '/nonexistent/file.txt' does not exist");

        let dir = tempdir().unwrap();
        let err = ReadTool::new()
            .execute(&read_call(dir.path().to_str().unwrap()))
            .await
            .unwrap_err();
        assert_eq!(err.message, "EISDIR: illegal operation on a directory, read");

        let bad = dir.path().join("latin1.txt");
        fs::write(&bad, [0x66, 0x6f, 0xff, 0xfe]).unwrap();
        let err = ReadTool::new()
            .execute(&read_call(bad.to_str().unwrap()))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Error: Unable to decode file as UTF-8");
    }

    #[tokio::test]
    async fn test_read_binary_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logo.PNG");
        fs::write(&path, [0u8; 12]).unwrap();

        let output = ReadTool::new()
            .execute(&read_call(path.to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(output, "Binary file: logo.PNG (12 bytes)");
    }

    #[tokio::test]
    async fn test_read_cuts_long_lines() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", "x".repeat(2500)).unwrap();
        let path = temp_file.path().to_str().unwrap();

        let output = ReadTool::new().execute(&read_call(path)).await.unwrap();
        let first = output.lines().next().unwrap();
        assert_eq!(first, format!("     1\t{}...", "x".repeat(2000)));
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/notes.txt");
        let path_str = path.to_str().unwrap();
        let content = "first line\n  indented\ttab\n\nlast";

        let output = WriteTool::new()
            .execute(
                &ToolCall::new(WRITE)
                    .with_arg("file_path", path_str)
                    .with_arg("content", content),
            )
            .await
            .unwrap();
        assert_eq!(output, format!("File created successfully at: {}", path_str));
        assert_eq!(fs::read_to_string(&path).unwrap(), content);

        let read = ReadTool::new().execute(&read_call(path_str)).await.unwrap();
        assert_eq!(strip_numbering(&read), content);
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "old").unwrap();
        let path = temp_file.path().to_str().unwrap();

        WriteTool::new()
            .execute(
                &ToolCall::new(WRITE)
                    .with_arg("file_path", path)
                    .with_arg("content", "new"),
            )
            .await
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "new");
    }
}
