//! REPL (Read-Eval-Print Loop) for interactive sessions

use crate::output::console::ConsoleFormatter;
use crate::progress::reporter::ConsoleProgress;
use colored::Colorize;
use klaude_application::{ConversationOrchestrator, RunConversationError, TurnOutcome};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::io;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const HISTORY_SIZE: usize = 1000;

/// What a line of input asked for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    Help,
    Model,
    UnknownCommand(&'a str),
    Message(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Empty,
        "exit" | "quit" | "/exit" | "/quit" | "/q" => Input::Exit,
        "/help" | "/h" | "/?" => Input::Help,
        "/model" => Input::Model,
        _ if line.starts_with('/') => Input::UnknownCommand(line),
        _ => Input::Message(line),
    }
}

/// Interactive session over one [`ConversationOrchestrator`].
pub struct ChatRepl {
    orchestrator: ConversationOrchestrator,
    progress: ConsoleProgress,
}

impl ChatRepl {
    pub fn new(orchestrator: ConversationOrchestrator) -> Self {
        Self {
            orchestrator,
            progress: ConsoleProgress::new(),
        }
    }

    /// Suppress the spinner and tool activity lines.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        if quiet {
            self.progress = ConsoleProgress::quiet();
        }
        self
    }

    /// Run one user message to completion.
    ///
    /// Ctrl-C cancels the turn: tools already running finish, no further
    /// completion is requested.
    pub async fn ask(&mut self, input: &str) -> Result<TurnOutcome, RunConversationError> {
        let token = CancellationToken::new();
        self.orchestrator.set_cancellation_token(token.clone());

        let turn = self.orchestrator.run_turn(input, &self.progress);
        tokio::pin!(turn);
        tokio::select! {
            outcome = &mut turn => return outcome,
            _ = tokio::signal::ctrl_c() => {}
        }

        debug!("Interrupt received, cancelling turn");
        token.cancel();
        turn.await
    }

    /// Read lines until `exit`, `quit` or end of input.
    pub async fn run(&mut self) -> io::Result<()> {
        let mut editor = Reedline::create();
        if let Some(path) = dirs::data_dir().map(|d| d.join("klaude").join("history.txt")) {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(HISTORY_SIZE, path) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => warn!("History disabled: {}", e),
            }
        }
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("klaude".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            let line = match editor.read_line(&prompt)? {
                Signal::Success(line) => line,
                Signal::CtrlC => continue,
                _ => break,
            };

            match classify(&line) {
                Input::Empty => {}
                Input::Exit => break,
                Input::Help => Self::print_help(),
                Input::Model => println!("Model: {}\n", self.orchestrator.model_name()),
                Input::UnknownCommand(cmd) => {
                    println!("Unknown command: {}", cmd);
                    println!("Type /help for available commands\n");
                }
                Input::Message(text) => {
                    println!();
                    match self.ask(text).await {
                        Ok(_) => {}
                        Err(RunConversationError::Cancelled) => {
                            println!("{}\n", "Interrupted".yellow());
                        }
                        Err(e) => eprintln!("{}\n", ConsoleFormatter::error(&e.to_string())),
                    }
                }
            }
        }

        self.orchestrator.end_session();
        println!("Bye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!(
            "{} {}",
            "klaude".bold().cyan(),
            format!("({})", self.orchestrator.model_name()).dimmed()
        );
        println!("Type a request, /help for commands, exit to leave.");
        println!();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  /help, /h, /?            - Show this help");
        println!("  /model                   - Show the current model");
        println!("  exit, quit, /exit, /q    - End the session");
        println!("Ctrl-C interrupts a running turn.");
        println!();
    }
}
