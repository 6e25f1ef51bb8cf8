//! Console progress reporting for conversation turns

use crate::output::console::ConsoleFormatter;
use indicatif::{ProgressBar, ProgressStyle};
use klaude_application::ConversationProgress;
use klaude_domain::{ToolInvocationRequest, ToolResult};
use std::sync::Mutex;
use std::time::Duration;

/// Renders a turn on the terminal: a spinner while the model is thinking,
/// a line per tool call and result, and the assistant's text.
///
/// In quiet mode only assistant text and warnings are printed.
pub struct ConsoleProgress {
    spinner: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            quiet: false,
        }
    }

    pub fn quiet() -> Self {
        Self {
            spinner: Mutex::new(None),
            quiet: true,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg:.dim} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn clear_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock()
            && let Some(spinner) = slot.take()
        {
            spinner.finish_and_clear();
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationProgress for ConsoleProgress {
    fn on_completion_start(&self) {
        if self.quiet {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.set_message("Thinking…");
        spinner.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut slot) = self.spinner.lock()
            && let Some(previous) = slot.replace(spinner)
        {
            previous.finish_and_clear();
        }
    }

    fn on_completion_end(&self) {
        self.clear_spinner();
    }

    fn on_assistant_text(&self, text: &str) {
        println!("{}\n", text.trim_end());
    }

    fn on_tool_call(&self, request: &ToolInvocationRequest) {
        if !self.quiet {
            println!("{}", ConsoleFormatter::tool_invocation(request));
        }
    }

    fn on_tool_result(&self, result: &ToolResult) {
        if !self.quiet {
            println!("{}\n", ConsoleFormatter::tool_result(result));
        }
    }

    fn on_warning(&self, message: &str) {
        self.clear_spinner();
        eprintln!("{}", ConsoleFormatter::warning(message));
    }
}
