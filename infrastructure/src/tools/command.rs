//! Command execution tool: Bash
//!
//! Each call runs in a fresh shell process. The working directory is carried
//! between calls: the shell records its final `pwd` on exit and the next
//! command starts there. The environment is a snapshot taken when the tool is
//! built.

use super::output::render_capped;
use async_trait::async_trait;
use klaude_domain::{Tool, ToolCall, ToolDefinition, ToolError, ToolParameter};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Tool name constant
pub const BASH: &str = "Bash";

/// Default timeout (2 minutes)
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Upper bound on a requested timeout (10 minutes)
pub const MAX_TIMEOUT_MS: u64 = 600_000;

const OUTPUT_HINT: &str = "Pipe the command through head, tail or grep to see a narrower slice.";

/// Runs shell commands with a persistent working directory.
pub struct BashTool {
    definition: ToolDefinition,
    shell: PathBuf,
    cwd: Mutex<PathBuf>,
    env: HashMap<String, String>,
    default_timeout_ms: u64,
    max_timeout_ms: u64,
}

impl BashTool {
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_working_dir(cwd)
    }

    pub fn with_working_dir(cwd: impl Into<PathBuf>) -> Self {
        let definition = ToolDefinition::new(
            BASH,
            "Executes a bash command with an optional timeout. The working directory persists \
             between commands, so `cd` carries over. Prefer the Glob, Grep, Read and LS tools \
             over find, grep, cat and ls. Output longer than 30000 characters is truncated.",
        )
        .with_parameter(ToolParameter::new("command", "The command to execute", true))
        .with_parameter(
            ToolParameter::new(
                "timeout",
                "Optional timeout in milliseconds (max 600000)",
                false,
            )
            .with_type("number"),
        )
        .with_parameter(ToolParameter::new(
            "description",
            "Clear, concise description of what this command does in 5-10 words",
            false,
        ));

        let shell = which::which("bash").unwrap_or_else(|_| PathBuf::from("sh"));

        Self {
            definition,
            shell,
            cwd: Mutex::new(cwd.into()),
            env: std::env::vars().collect(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_timeout_ms: MAX_TIMEOUT_MS,
        }
    }

    /// Override the default and maximum timeouts (milliseconds).
    pub fn with_timeouts(mut self, default_ms: u64, max_ms: u64) -> Self {
        self.max_timeout_ms = max_ms.max(1);
        self.default_timeout_ms = default_ms.clamp(1, self.max_timeout_ms);
        self
    }

    /// Directory the next command starts in.
    pub fn working_dir(&self) -> PathBuf {
        match self.cwd.lock() {
            Ok(cwd) => cwd.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_working_dir(&self, dir: PathBuf) {
        match self.cwd.lock() {
            Ok(mut cwd) => *cwd = dir,
            Err(poisoned) => *poisoned.into_inner() = dir,
        }
    }

    fn timeout_for(&self, call: &ToolCall) -> u64 {
        match call.get_i64("timeout") {
            Some(ms) if ms > 0 => (ms as u64).min(self.max_timeout_ms),
            _ => self.default_timeout_ms,
        }
    }

    fn build_command(&self, command: &str, cwd: &Path, pwd_file: &Path) -> Command {
        let script = format!(
            "trap \"pwd -P > {}\" EXIT\n{}",
            shell_quote(&pwd_file.to_string_lossy()),
            command
        );

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(script)
            .current_dir(cwd)
            .env_clear()
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(target_os = "linux")]
        cmd.process_group(0);
        cmd
    }
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BashTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let command = call.require_string("command")?;
        let timeout_ms = self.timeout_for(call);
        let cwd = self.working_dir();
        let start = Instant::now();

        let pwd_file = tempfile::NamedTempFile::new()
            .map_err(|e| ToolError::execution_failed(format!("Error executing command: {}", e)))?;

        let child = self
            .build_command(command, &cwd, pwd_file.path())
            .spawn()
            .map_err(|e| ToolError::execution_failed(format!("Error executing command: {}", e)))?;
        let pid = child.id();

        debug!(
            command = %command,
            cwd = %cwd.display(),
            timeout_ms,
            description = call.get_string("description").unwrap_or(""),
            "Running shell command"
        );

        let output = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            child.wait_with_output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::execution_failed(format!(
                    "Error executing command: {}",
                    e
                )));
            }
            Err(_) => {
                // The shell itself is killed on drop; take its children with it.
                kill_process_group(pid);
                warn!(command = %command, timeout_ms, "Shell command timed out");
                return Err(ToolError::timeout(format!(
                    "Command timed out after {} seconds",
                    format_seconds(timeout_ms)
                )));
            }
        };

        if let Ok(dir) = std::fs::read_to_string(pwd_file.path()) {
            let dir = dir.trim_end_matches(['\n', '\r']);
            if !dir.is_empty() && Path::new(dir).is_dir() {
                self.set_working_dir(PathBuf::from(dir));
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = stdout.trim_end_matches('\n');
        let stderr = stderr.trim_end_matches('\n');

        let combined = match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{}\n{}", stdout, stderr),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (true, true) => String::new(),
        };

        let code = output.status.code().unwrap_or(-1);
        debug!(
            code,
            duration_ms = start.elapsed().as_millis() as u64,
            bytes = combined.len(),
            "Shell command finished"
        );

        if combined.is_empty() {
            if !output.status.success() {
                return Err(ToolError::execution_failed(format!(
                    "Command failed with return code {}",
                    code
                )));
            }
            return Ok("Command executed successfully with no output".to_string());
        }

        let lines: Vec<&str> = combined.split('\n').collect();
        Ok(render_capped(&lines, "lines", OUTPUT_HINT))
    }
}

/// Quote `s` for a POSIX shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Milliseconds as a seconds figure: `120` or `0.5`.
fn format_seconds(ms: u64) -> String {
    if ms % 1000 == 0 {
        (ms / 1000).to_string()
    } else {
        let secs = ms as f64 / 1000.0;
        format!("{}", secs)
    }
}

#[cfg(target_os = "linux")]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // SAFETY: kill(2) with a negative pid only signals that process group.
        unsafe {
            libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn kill_process_group(_pid: Option<u32>) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn bash(command: &str) -> ToolCall {
        ToolCall::new(BASH).with_arg("command", command)
    }

    #[tokio::test]
    async fn test_echo() {
        let tool = BashTool::new();
        let output = tool.execute(&bash("echo hello")).await.unwrap();
        assert_eq!(output, "hello");
    }

    #[tokio::test]
    async fn test_stdout_then_stderr() {
        let tool = BashTool::new();
        let output = tool
            .execute(&bash("echo out; echo err 1>&2"))
            .await
            .unwrap();
        assert_eq!(output, "out\nerr");
    }

    #[tokio::test]
    async fn test_no_output() {
        let tool = BashTool::new();
        assert_eq!(
            tool.execute(&bash("true")).await.unwrap(),
            "Command executed successfully with no output"
        );

        let err = tool.execute(&bash("exit 3")).await.unwrap_err();
        assert_eq!(err.message, "Command failed with return code 3");
    }

    #[tokio::test]
    async fn test_failure_with_output_is_returned() {
        let tool = BashTool::new();
        let output = tool
            .execute(&bash("echo partial; exit 1"))
            .await
            .unwrap();
        assert_eq!(output, "partial");
    }

    #[tokio::test]
    async fn test_cd_persists_between_calls() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let tool = BashTool::with_working_dir(dir.path());

        tool.execute(&bash("cd sub")).await.unwrap();
        let output = tool.execute(&bash("pwd -P")).await.unwrap();
        assert_eq!(
            PathBuf::from(output),
            sub.canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let tool = BashTool::new();
        let start = Instant::now();
        let err = tool
            .execute(&bash("sleep 5").with_arg("timeout", 100))
            .await
            .unwrap_err();
        assert_eq!(err.code, "TIMEOUT");
        assert_eq!(err.message, "Command timed out after 0.1 seconds");
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_env_snapshot() {
        let tool = BashTool::new();
        let output = tool.execute(&bash("echo ${PATH:+set}")).await.unwrap();
        assert_eq!(output, "set");
    }

    #[test]
    fn test_timeout_is_clamped() {
        let tool = BashTool::new().with_timeouts(1_000, 5_000);
        assert_eq!(tool.timeout_for(&bash("x")), 1_000);
        assert_eq!(tool.timeout_for(&bash("x").with_arg("timeout", 60_000)), 5_000);
        assert_eq!(tool.timeout_for(&bash("x").with_arg("timeout", 0)), 1_000);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(120_000), "120");
        assert_eq!(format_seconds(1_500), "1.5");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("a'b"), r"'a'\''b'");
    }
}
