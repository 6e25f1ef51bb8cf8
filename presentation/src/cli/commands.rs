//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for klaude
#[derive(Parser, Debug)]
#[command(name = "klaude")]
#[command(author, version, about = "A terminal coding assistant that works through tools")]
#[command(long_about = r#"
klaude sends your request to a language model together with a set of tools
(shell, file search, reading and editing files, notebooks, web fetch and
search, a todo list and sub-agents) and keeps running the tools the model
asks for until it has an answer.

Configuration files are loaded from (in priority order):
1. KLAUDE_* environment variables   e.g. KLAUDE_MODEL__NAME=gpt-4.1
2. --config <path>                  Explicit config file
3. ./klaude.toml                    Project-level config
4. ~/.config/klaude/config.toml     Global config

Example:
  klaude -p "Summarize what src/main.rs does"
  klaude -i --model gpt-4.1
"#)]
pub struct Cli {
    /// Run a single prompt and exit
    #[arg(short, long, value_name = "TEXT", conflicts_with = "interactive")]
    pub prompt: Option<String>,

    /// Start the interactive REPL (the default when no prompt is given)
    #[arg(short, long)]
    pub interactive: bool,

    /// Model to use, overriding the config file
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the spinner and tool activity lines
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write diagnostic logs to a daily rolling file in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Append the conversation transcript (JSONL) to this file
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,
}

impl Cli {
    /// Tracing filter directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_prompt_mode() {
        let cli = Cli::try_parse_from(["klaude", "-p", "list the files", "-vv"]).unwrap();
        assert_eq!(cli.prompt.as_deref(), Some("list the files"));
        assert!(!cli.interactive);
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_prompt_conflicts_with_interactive() {
        assert!(Cli::try_parse_from(["klaude", "-p", "x", "-i"]).is_err());
    }

    #[test]
    fn test_config_flags() {
        let cli = Cli::try_parse_from([
            "klaude",
            "--config",
            "team.toml",
            "--conversation-log",
            "out.jsonl",
            "--model",
            "gpt-4.1",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("team.toml")));
        assert_eq!(cli.conversation_log, Some(PathBuf::from("out.jsonl")));
        assert_eq!(cli.model.as_deref(), Some("gpt-4.1"));
        assert_eq!(cli.log_level(), "warn");
    }
}
