//! Built-in system prompt

use chrono::Local;
use std::path::Path;

const INSTRUCTIONS: &str = "You are klaude, an assistant for software engineering work in \
the user's terminal. Use the tools to inspect and change the project instead of guessing. \
Read a file before editing it, prefer Edit or MultiEdit over rewriting whole files, and keep \
changes to what was asked. Independent tool calls may be issued together; they run \
concurrently. Track multi-step work with TodoWrite. Delegate broad searches to Task when the \
answer fits in a short report. Be concise: the user reads your replies in a terminal.";

/// Instructions plus a short description of where the session runs.
pub fn default_system_prompt(working_dir: &Path) -> String {
    format!(
        "{}\n\n<env>\nWorking directory: {}\nPlatform: {}\nToday's date: {}\n</env>",
        INSTRUCTIONS,
        working_dir.display(),
        std::env::consts::OS,
        Local::now().format("%Y-%m-%d"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_working_dir() {
        let prompt = default_system_prompt(Path::new("/work/project"));
        assert!(prompt.starts_with("You are klaude"));
        assert!(prompt.contains("Working directory: /work/project"));
        assert!(prompt.ends_with("</env>"));
    }
}
