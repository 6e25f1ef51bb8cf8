//! Search tools: Glob, Grep
//!
//! Grep runs ripgrep when it is installed and otherwise searches in-process
//! with the `regex` crate. The fallback has no look-around or backreferences,
//! which matches ripgrep's default engine, and skips hidden entries the way
//! ripgrep does.

use super::fs_util::run_blocking;
use super::output::render_capped;
use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use klaude_domain::{Tool, ToolCall, ToolDefinition, ToolError, ToolParameter};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Tool name constants
pub const GLOB: &str = "Glob";
pub const GREP: &str = "Grep";

const GLOB_HINT: &str =
    "To see all results, use a more specific pattern or search in a subdirectory.";
const GREP_HINT: &str =
    "To see more results, use head_limit parameter or search in specific directories.";

/// Files larger than this are skipped by the in-process search (5 MB)
const MAX_GREP_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Expand the first `{a,b}` group in `pattern`. Patterns without one come
/// back unchanged.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[open..].find('}').map(|i| open + i) else {
        return vec![pattern.to_string()];
    };
    let options = &pattern[open + 1..close];
    if options.is_empty() {
        return vec![pattern.to_string()];
    }
    options
        .split(',')
        .map(|option| {
            format!(
                "{}{}{}",
                &pattern[..open],
                option.trim(),
                &pattern[close + 1..]
            )
        })
        .collect()
}

fn resolve_search_root(path: Option<&str>) -> Result<PathBuf, ToolError> {
    let root = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()
            .map_err(|e| ToolError::execution_failed(format!("Error: {}", e)))?,
    };
    if !root.exists() {
        return Err(ToolError::not_found(format!(
            "Error: Path '{}' does not exist",
            root.display()
        )));
    }
    Ok(root)
}

// ---------------------------------------------------------------------------
// Glob
// ---------------------------------------------------------------------------

/// Fast file pattern matching, newest files first.
pub struct GlobTool {
    definition: ToolDefinition,
}

impl GlobTool {
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            GLOB,
            "Fast file pattern matching tool that works with any codebase size. Supports glob \
             patterns like \"**/*.js\" or \"src/**/*.{ts,tsx}\". Returns matching file paths \
             sorted by modification time, newest first.",
        )
        .with_parameter(ToolParameter::new(
            "pattern",
            "The glob pattern to match files against",
            true,
        ))
        .with_parameter(ToolParameter::new(
            "path",
            "The directory to search in. Defaults to the current working directory.",
            false,
        ));
        Self { definition }
    }
}

impl Default for GlobTool {
    fn default() -> Self {
        Self::new()
    }
}

fn glob_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, ToolError> {
    let escaped_root = Pattern::escape(&root.to_string_lossy());
    let mut found = BTreeSet::new();

    for expanded in expand_braces(pattern) {
        let full = if Path::new(&expanded).is_absolute() {
            expanded
        } else {
            format!("{}/{}", escaped_root.trim_end_matches('/'), expanded)
        };
        let paths = glob::glob(&full).map_err(|e| {
            ToolError::invalid_argument(format!("Error: Invalid glob pattern: {}", e))
        })?;
        found.extend(paths.flatten().filter(|p| p.is_file()));
    }

    let mut dated: Vec<(SystemTime, PathBuf)> = found
        .into_iter()
        .map(|p| {
            let modified = fs::metadata(&p)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let absolute = std::path::absolute(&p).unwrap_or(p);
            (modified, absolute)
        })
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Ok(dated.into_iter().map(|(_, p)| p).collect())
}

#[async_trait]
impl Tool for GlobTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let pattern = call.require_string("pattern")?.to_string();
        let root = resolve_search_root(call.get_string("path"))?;

        run_blocking(move || {
            let files = glob_files(&root, &pattern)?;
            debug!(pattern = %pattern, matches = files.len(), "Glob finished");
            if files.is_empty() {
                return Ok(format!("No files found matching pattern: {}", pattern));
            }
            let lines: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
            Ok(render_capped(&lines, "files", GLOB_HINT))
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Grep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Content,
    FilesWithMatches,
    Count,
}

impl OutputMode {
    fn parse(s: Option<&str>) -> Result<Self, ToolError> {
        match s {
            None | Some("files_with_matches") => Ok(OutputMode::FilesWithMatches),
            Some("content") => Ok(OutputMode::Content),
            Some("count") => Ok(OutputMode::Count),
            Some(other) => Err(ToolError::invalid_argument(format!(
                "Error: Invalid output_mode '{}'. Expected content, files_with_matches or count",
                other
            ))),
        }
    }
}

/// Decoded Grep arguments.
#[derive(Debug, Clone)]
struct GrepQuery {
    pattern: String,
    path: PathBuf,
    glob: Option<String>,
    file_type: Option<String>,
    mode: OutputMode,
    case_insensitive: bool,
    line_numbers: bool,
    before: Option<usize>,
    after: Option<usize>,
    context: Option<usize>,
    head_limit: Option<usize>,
    multiline: bool,
}

impl GrepQuery {
    fn from_call(call: &ToolCall) -> Result<Self, ToolError> {
        let count = |key: &str| {
            call.get_i64(key)
                .filter(|n| *n >= 0)
                .map(|n| n as usize)
        };
        Ok(Self {
            pattern: call.require_string("pattern")?.to_string(),
            path: PathBuf::from(call.get_string("path").unwrap_or(".")),
            glob: call.get_string("glob").map(str::to_string),
            file_type: call.get_string("type").map(str::to_string),
            mode: OutputMode::parse(call.get_string("output_mode"))?,
            case_insensitive: call.get_bool("-i").unwrap_or(false),
            line_numbers: call.get_bool("-n").unwrap_or(false),
            before: count("-B"),
            after: count("-A"),
            context: count("-C"),
            head_limit: count("head_limit").filter(|n| *n > 0),
            multiline: call.get_bool("multiline").unwrap_or(false),
        })
    }

    fn before_lines(&self) -> usize {
        self.before.or(self.context).unwrap_or(0)
    }

    fn after_lines(&self) -> usize {
        self.after.or(self.context).unwrap_or(0)
    }

    fn rg_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.case_insensitive {
            args.push("-i".into());
        }
        if self.line_numbers && self.mode == OutputMode::Content {
            args.push("-n".into());
        }
        if self.multiline {
            args.extend(["-U".into(), "--multiline-dotall".into()]);
        }
        for (flag, value) in [("-A", self.after), ("-B", self.before), ("-C", self.context)] {
            if let Some(n) = value {
                args.extend([flag.to_string(), n.to_string()]);
            }
        }
        if let Some(glob) = &self.glob {
            args.extend(["--glob".into(), glob.clone()]);
        }
        if let Some(file_type) = &self.file_type {
            args.extend(["--type".into(), file_type.clone()]);
        }
        match self.mode {
            OutputMode::FilesWithMatches => args.push("-l".into()),
            OutputMode::Count => args.push("-c".into()),
            OutputMode::Content => {}
        }
        // `-e` and `--` keep a leading dash in the pattern or path from reading as a flag.
        args.extend([
            "-e".into(),
            self.pattern.clone(),
            "--".into(),
            self.path.to_string_lossy().into_owned(),
        ]);
        args
    }
}

/// Content search over files, ripgrep flavoured.
pub struct GrepTool {
    definition: ToolDefinition,
    binary: String,
    prefer_external: bool,
}

impl GrepTool {
    pub fn new() -> Self {
        let number = |name: &str, desc: &str| ToolParameter::new(name, desc, false).with_type("number");
        let flag = |name: &str, desc: &str| ToolParameter::new(name, desc, false).with_type("boolean");

        let definition = ToolDefinition::new(
            GREP,
            "A powerful search tool built on ripgrep. Supports full regex syntax (e.g. \
             \"log.*Error\", \"function\\s+\\w+\"). Filter files with the glob or type \
             parameters. Output modes: \"content\" shows matching lines, \"files_with_matches\" \
             shows only file paths (default), \"count\" shows match counts.",
        )
        .with_parameter(ToolParameter::new(
            "pattern",
            "The regular expression pattern to search for in file contents",
            true,
        ))
        .with_parameter(ToolParameter::new(
            "path",
            "File or directory to search in (rg PATH). Defaults to current working directory.",
            false,
        ))
        .with_parameter(ToolParameter::new(
            "glob",
            "Glob pattern to filter files (e.g. \"*.js\", \"*.{ts,tsx}\") - maps to rg --glob",
            false,
        ))
        .with_parameter(ToolParameter::new(
            "type",
            "File type to search (rg --type). Common types: js, py, rust, go, java, etc.",
            false,
        ))
        .with_parameter(
            ToolParameter::new("output_mode", "Output mode for the results", false)
                .with_enum(["content", "files_with_matches", "count"]),
        )
        .with_parameter(flag("-i", "Case insensitive search (rg -i)"))
        .with_parameter(flag(
            "-n",
            "Show line numbers in output (rg -n). Requires output_mode: \"content\".",
        ))
        .with_parameter(number(
            "-A",
            "Number of lines to show after each match (rg -A). Requires output_mode: \"content\".",
        ))
        .with_parameter(number(
            "-B",
            "Number of lines to show before each match (rg -B). Requires output_mode: \"content\".",
        ))
        .with_parameter(number(
            "-C",
            "Number of lines to show before and after each match (rg -C). Requires output_mode: \"content\".",
        ))
        .with_parameter(number(
            "head_limit",
            "Limit output to first N lines/entries, equivalent to \"| head -N\".",
        ))
        .with_parameter(flag(
            "multiline",
            "Enable multiline mode where . matches newlines and patterns can span lines (rg -U --multiline-dotall).",
        ));

        Self {
            definition,
            binary: "rg".to_string(),
            prefer_external: true,
        }
    }

    /// Use a different ripgrep executable.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Skip ripgrep and always search in-process.
    pub fn prefer_external(mut self, prefer: bool) -> Self {
        self.prefer_external = prefer;
        self
    }

    /// Run ripgrep. `None` when the binary is not installed.
    async fn run_ripgrep(&self, query: &GrepQuery) -> Result<Option<Vec<String>>, ToolError> {
        let output = match tokio::process::Command::new(&self.binary)
            .args(query.rg_args())
            .stdin(std::process::Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ToolError::execution_failed(format!("Error: {}", e))),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        // Exit code 1 means no matches; 2 is an error unless something matched.
        if output.status.code() == Some(2) && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::execution_failed(format!(
                "Error: {}",
                stderr.trim()
            )));
        }

        Ok(Some(
            stdout
                .trim_end_matches('\n')
                .split('\n')
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        ))
    }
}

impl Default for GrepTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for GrepTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let query = GrepQuery::from_call(call)?;
        if !query.path.exists() {
            return Err(ToolError::not_found(format!(
                "Error: Path '{}' does not exist",
                query.path.display()
            )));
        }

        let external = if self.prefer_external {
            self.run_ripgrep(&query).await?
        } else {
            None
        };

        let mut lines = match external {
            Some(lines) => lines,
            None => {
                debug!(binary = %self.binary, "ripgrep unavailable, searching in-process");
                let query = query.clone();
                let joined = run_blocking(move || fallback_search(&query).map(|l| l.join("\n")))
                    .await?;
                if joined.is_empty() {
                    Vec::new()
                } else {
                    joined.split('\n').map(str::to_string).collect()
                }
            }
        };

        if let Some(limit) = query.head_limit {
            lines.truncate(limit);
        }
        debug!(pattern = %query.pattern, results = lines.len(), "Grep finished");

        if lines.is_empty() {
            return Ok("No matches found".to_string());
        }
        Ok(render_capped(&lines, "results", GREP_HINT))
    }
}

// ---------------------------------------------------------------------------
// In-process fallback
// ---------------------------------------------------------------------------

/// Extensions for the common ripgrep `--type` names.
fn type_extensions(file_type: &str) -> Option<&'static [&'static str]> {
    let exts: &'static [&'static str] = match file_type {
        "rust" => &["rs"],
        "py" => &["py", "pyi"],
        "js" => &["js", "jsx", "mjs", "cjs"],
        "ts" => &["ts", "tsx", "mts", "cts"],
        "go" => &["go"],
        "java" => &["java"],
        "c" => &["c", "h"],
        "cpp" => &["cpp", "cc", "cxx", "hpp", "hh", "hxx", "h"],
        "md" | "markdown" => &["md", "markdown"],
        "json" => &["json"],
        "toml" => &["toml"],
        "yaml" => &["yaml", "yml"],
        "sh" => &["sh", "bash", "zsh"],
        "html" => &["html", "htm"],
        "css" => &["css", "scss"],
        "rb" | "ruby" => &["rb"],
        _ => return None,
    };
    Some(exts)
}

/// Which files under the search root are searched.
struct FileFilter {
    globs: Vec<Pattern>,
    extensions: Option<&'static [&'static str]>,
}

impl FileFilter {
    fn new(query: &GrepQuery) -> Result<Self, ToolError> {
        let globs = match &query.glob {
            Some(glob) => expand_braces(glob)
                .iter()
                .map(|g| {
                    Pattern::new(g).map_err(|e| {
                        ToolError::invalid_argument(format!("Error: Invalid glob pattern: {}", e))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let extensions = match &query.file_type {
            Some(t) => Some(type_extensions(t).ok_or_else(|| {
                ToolError::invalid_argument(format!("Error: unrecognized file type: {}", t))
            })?),
            None => None,
        };
        Ok(Self { globs, extensions })
    }

    fn accepts(&self, root: &Path, file: &Path) -> bool {
        if let Some(exts) = self.extensions {
            let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !exts.contains(&ext) {
                return false;
            }
        }
        if self.globs.is_empty() {
            return true;
        }
        let options = MatchOptions {
            require_literal_separator: false,
            ..MatchOptions::new()
        };
        let relative = file.strip_prefix(root).unwrap_or(file);
        let name = file.file_name().map(Path::new).unwrap_or(file);
        self.globs.iter().any(|g| {
            let target = if g.as_str().contains('/') { relative } else { name };
            g.matches_path_with(target, options)
        })
    }
}

/// Regular files under `dir` in name order, skipping hidden entries and
/// symlinks.
fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = entries.flatten().collect();
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            walk_files(&entry.path(), out);
        } else if file_type.is_file() {
            out.push(entry.path());
        }
    }
}

/// Zero-based indices of lines touched by a match.
fn matched_lines(regex: &Regex, content: &str, multiline: bool) -> Vec<usize> {
    if !multiline {
        return content
            .lines()
            .enumerate()
            .filter(|(_, line)| regex.is_match(line))
            .map(|(i, _)| i)
            .collect();
    }

    let line_of = |offset: usize| content[..offset].matches('\n').count();
    let mut hits = BTreeSet::new();
    for m in regex.find_iter(content) {
        let first = line_of(m.start());
        let last = line_of(m.end().saturating_sub(1).max(m.start()));
        hits.extend(first..=last);
    }
    hits.into_iter().collect()
}

/// Render matches with ripgrep's separators: `:` on matching lines, `-` on
/// context lines and `--` between non-adjacent groups.
fn render_content(
    file: &str,
    lines: &[&str],
    hits: &[usize],
    query: &GrepQuery,
    out: &mut Vec<String>,
) {
    let (before, after) = (query.before_lines(), query.after_lines());
    let with_context = before > 0 || after > 0;
    let hit_set: BTreeSet<usize> = hits.iter().copied().collect();

    let mut groups: Vec<(usize, usize)> = Vec::new();
    for &hit in hits {
        let start = hit.saturating_sub(before);
        let end = (hit + after).min(lines.len().saturating_sub(1));
        match groups.last_mut() {
            Some((_, last_end)) if start <= *last_end + 1 => *last_end = (*last_end).max(end),
            _ => groups.push((start, end)),
        }
    }

    for (start, end) in groups {
        if with_context && !out.is_empty() {
            out.push("--".to_string());
        }
        for (i, line) in lines.iter().enumerate().take(end + 1).skip(start) {
            let sep = if hit_set.contains(&i) { ':' } else { '-' };
            if query.line_numbers {
                out.push(format!("{}{}{}{}{}", file, sep, i + 1, sep, line));
            } else {
                out.push(format!("{}{}{}", file, sep, line));
            }
        }
    }
}

fn fallback_search(query: &GrepQuery) -> Result<Vec<String>, ToolError> {
    let regex = RegexBuilder::new(&query.pattern)
        .case_insensitive(query.case_insensitive)
        .multi_line(query.multiline)
        .dot_matches_new_line(query.multiline)
        .build()
        .map_err(|e| ToolError::invalid_argument(format!("Error: Invalid regex pattern: {}", e)))?;

    let filter = FileFilter::new(query)?;
    let files = if query.path.is_file() {
        vec![query.path.clone()]
    } else {
        let mut files = Vec::new();
        walk_files(&query.path, &mut files);
        files
            .into_iter()
            .filter(|f| filter.accepts(&query.path, f))
            .collect()
    };

    let mut out = Vec::new();
    for file in files {
        if fs::metadata(&file).is_ok_and(|m| m.len() > MAX_GREP_FILE_SIZE) {
            continue;
        }
        // Unreadable or non-UTF-8 (binary) files are skipped.
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };
        let display = file.display().to_string();

        match query.mode {
            OutputMode::FilesWithMatches => {
                if regex.is_match(&content) {
                    out.push(display);
                }
            }
            OutputMode::Count => {
                let count = matched_lines(&regex, &content, query.multiline).len();
                if count > 0 {
                    out.push(format!("{}:{}", display, count));
                }
            }
            OutputMode::Content => {
                let hits = matched_lines(&regex, &content, query.multiline);
                if !hits.is_empty() {
                    let lines: Vec<&str> = content.lines().collect();
                    render_content(&display, &lines, &hits, query, &mut out);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {\n    run();\n}\n").unwrap();
        fs::write(dir.path().join("src/nested/lib.rs"), "pub fn run() {}\n// TODO later\n").unwrap();
        fs::write(dir.path().join("src/app.ts"), "export function run() {}\n").unwrap();
        fs::write(dir.path().join("README.md"), "# Demo\nrun it\n").unwrap();
        fs::write(dir.path().join(".git/config"), "run = true\n").unwrap();
        dir
    }

    fn grep(dir: &Path, pattern: &str) -> ToolCall {
        ToolCall::new(GREP)
            .with_arg("pattern", pattern)
            .with_arg("path", dir.to_str().unwrap())
    }

    fn in_process() -> GrepTool {
        GrepTool::new().with_binary("klaude-no-such-ripgrep-binary")
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand_braces("*.{ts,tsx}"), vec!["*.ts", "*.tsx"]);
        assert_eq!(expand_braces("src/**/*.rs"), vec!["src/**/*.rs"]);
        assert_eq!(expand_braces("{a, b}/x"), vec!["a/x", "b/x"]);
    }

    #[tokio::test]
    async fn test_glob_recursive_absolute_paths() {
        let dir = fixture();
        let call = ToolCall::new(GLOB)
            .with_arg("pattern", "**/*.rs")
            .with_arg("path", dir.path().to_str().unwrap());
        let output = GlobTool::new().execute(&call).await.unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| Path::new(l).is_absolute()));
        assert!(output.contains("main.rs"));
        assert!(output.contains("lib.rs"));
    }

    #[tokio::test]
    async fn test_glob_brace_expansion() {
        let dir = fixture();
        let call = ToolCall::new(GLOB)
            .with_arg("pattern", "src/*.{rs,ts}")
            .with_arg("path", dir.path().to_str().unwrap());
        let output = GlobTool::new().execute(&call).await.unwrap();
        assert!(output.contains("main.rs"));
        assert!(output.contains("app.ts"));
        assert!(!output.contains("lib.rs"));
    }

    #[tokio::test]
    async fn test_glob_newest_first() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old.txt");
        let new = dir.path().join("new.txt");
        fs::write(&old, "a").unwrap();
        fs::write(&new, "b").unwrap();
        let past = SystemTime::now() - std::time::Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let call = ToolCall::new(GLOB)
            .with_arg("pattern", "*.txt")
            .with_arg("path", dir.path().to_str().unwrap());
        let output = GlobTool::new().execute(&call).await.unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].ends_with("new.txt"));
        assert!(lines[1].ends_with("old.txt"));
    }

    #[tokio::test]
    async fn test_glob_no_matches_and_missing_path() {
        let dir = fixture();
        let call = ToolCall::new(GLOB)
            .with_arg("pattern", "*.zig")
            .with_arg("path", dir.path().to_str().unwrap());
        assert_eq!(
            GlobTool::new().execute(&call).await.unwrap(),
            "No files found matching pattern: *.zig"
        );

        let call = ToolCall::new(GLOB)
            .with_arg("pattern", "*")
            .with_arg("path", dir.path().join("nope").to_str().unwrap());
        let err = GlobTool::new().execute(&call).await.unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_grep_fallback_files_with_matches_skips_hidden() {
        let dir = fixture();
        let output = in_process().execute(&grep(dir.path(), "run")).await.unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(!output.contains(".git"));
    }

    #[tokio::test]
    async fn test_grep_fallback_content_with_line_numbers() {
        let dir = fixture();
        let call = grep(&dir.path().join("src/main.rs"), "run")
            .with_arg("output_mode", "content")
            .with_arg("-n", true);
        let output = in_process().execute(&call).await.unwrap();
        assert!(output.ends_with("main.rs:2:    run();"));
    }

    #[tokio::test]
    async fn test_grep_fallback_context_separators() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "a\nhit\nb\nc\nd\ne\nhit\nf\n").unwrap();
        let call = grep(&file, "hit")
            .with_arg("output_mode", "content")
            .with_arg("-n", true)
            .with_arg("-C", 1);
        let output = in_process().execute(&call).await.unwrap();
        let f = file.display().to_string();
        let expected = [
            format!("{f}-1-a"),
            format!("{f}:2:hit"),
            format!("{f}-3-b"),
            "--".to_string(),
            format!("{f}-6-e"),
            format!("{f}:7:hit"),
            format!("{f}-8-f"),
        ]
        .join("\n");
        assert_eq!(output, expected);
    }

    #[tokio::test]
    async fn test_grep_fallback_count_glob_and_type() {
        let dir = fixture();
        let call = grep(dir.path(), "run")
            .with_arg("output_mode", "count")
            .with_arg("glob", "*.{rs,ts}");
        let output = in_process().execute(&call).await.unwrap();
        assert_eq!(output.lines().count(), 3);
        assert!(output.lines().all(|l| l.ends_with(":1")));

        let call = grep(dir.path(), "run").with_arg("type", "rust");
        let output = in_process().execute(&call).await.unwrap();
        assert_eq!(output.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_grep_fallback_case_and_multiline() {
        let dir = fixture();
        let call = grep(dir.path(), "demo").with_arg("-i", true);
        let output = in_process().execute(&call).await.unwrap();
        assert!(output.ends_with("README.md"));

        let call = grep(dir.path(), r"main\(\) \{.*run")
            .with_arg("multiline", true)
            .with_arg("output_mode", "content");
        let output = in_process().execute(&call).await.unwrap();
        assert_eq!(output.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_grep_head_limit_and_no_matches() {
        let dir = fixture();
        let call = grep(dir.path(), "run").with_arg("head_limit", 1);
        let output = in_process().execute(&call).await.unwrap();
        assert_eq!(output.lines().count(), 1);

        let output = in_process()
            .execute(&grep(dir.path(), "zzz_absent"))
            .await
            .unwrap();
        assert_eq!(output, "No matches found");
    }

    #[tokio::test]
    async fn test_grep_errors() {
        let dir = fixture();
        let err = in_process()
            .execute(&grep(dir.path(), "("))
            .await
            .unwrap_err();
        assert!(err.message.starts_with("Error: Invalid regex pattern"));

        let err = in_process()
            .execute(&grep(&dir.path().join("missing"), "x"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");

        let err = in_process()
            .execute(&grep(dir.path(), "x").with_arg("type", "cobol"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Error: unrecognized file type: cobol");
    }

    #[test]
    fn test_rg_args() {
        let call = ToolCall::new(GREP)
            .with_arg("pattern", "foo")
            .with_arg("output_mode", "content")
            .with_arg("-n", true)
            .with_arg("-A", 2)
            .with_arg("glob", "*.rs");
        let query = GrepQuery::from_call(&call).unwrap();
        assert_eq!(
            query.rg_args(),
            vec!["-n", "-A", "2", "--glob", "*.rs", "-e", "foo", "--", "."]
        );

        let call = ToolCall::new(GREP).with_arg("pattern", "foo").with_arg("-n", true);
        let query = GrepQuery::from_call(&call).unwrap();
        assert_eq!(query.rg_args(), vec!["-l", "-e", "foo", "--", "."]);

        let call = ToolCall::new(GREP)
            .with_arg("pattern", "--verbose")
            .with_arg("output_mode", "count");
        let query = GrepQuery::from_call(&call).unwrap();
        assert_eq!(query.rg_args(), vec!["-c", "-e", "--verbose", "--", "."]);
    }

    #[tokio::test]
    async fn test_grep_fallback_pattern_with_leading_dash() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.rs"), "fn run() -> Result<()> {}\nfn other() {}\n").unwrap();

        let output = in_process()
            .execute(&grep(dir.path(), "-> Result"))
            .await
            .unwrap();
        assert!(output.contains("main.rs"));
    }
}
