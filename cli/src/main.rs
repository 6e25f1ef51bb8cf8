//! CLI entrypoint for klaude
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod system_prompt;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use klaude_application::{
    ConversationLogger, ConversationOrchestrator, LlmGateway, NestedAgentRunner,
    NoConversationLogger, ToolSchemaPort,
};
use klaude_infrastructure::{
    ConfigLoader, FileConfig, JsonSchemaToolConverter, JsonlConversationLogger, OpenAiGateway,
    TodoStore, default_registry,
};
use klaude_presentation::{ChatRepl, Cli};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let _log_guard = init_tracing(&cli)?;
    info!("Starting klaude");

    let config = load_config(&cli)?;
    let mut repl = ChatRepl::new(build_orchestrator(&config)?).with_quiet(cli.quiet);

    if let Some(prompt) = &cli.prompt {
        repl.ask(prompt).await?;
        return Ok(());
    }

    repl.run().await?;
    Ok(())
}

/// Stderr logging filtered by `-v`, plus a daily rolling file with `--log-dir`.
fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "klaude.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(cli.log_level()))
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

/// Config files and environment, then command-line overrides.
fn load_config(cli: &Cli) -> Result<FileConfig> {
    let loaded = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
    };
    let mut config = loaded.map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

    if let Some(model) = &cli.model {
        config.model.name = model.clone();
    }
    if let Some(path) = &cli.conversation_log {
        config.logging.conversation_log = Some(path.clone());
    }

    if let Err(e) = config.validate() {
        bail!("Invalid configuration: {}", e);
    }
    Ok(config)
}

// === Dependency Injection ===
fn build_orchestrator(config: &FileConfig) -> Result<ConversationOrchestrator> {
    let gateway: Arc<dyn LlmGateway> = Arc::new(OpenAiGateway::from_config(&config.model)?);
    let schema: Arc<dyn ToolSchemaPort> = Arc::new(JsonSchemaToolConverter);
    let logger = conversation_logger(config);
    let todos = Arc::new(TodoStore::new());
    let settings = config.tool_settings();
    let params = config.execution_params();

    // Sub-agents get every tool except Task.
    let nested_tools = default_registry(&settings, Arc::clone(&todos), None)
        .context("Failed to build the sub-agent tool set")?;
    let agents = NestedAgentRunner::new(
        Arc::clone(&gateway),
        Arc::new(nested_tools),
        Arc::clone(&schema),
        params.clone(),
    )
    .with_conversation_logger(Arc::clone(&logger));

    let tools = default_registry(&settings, Arc::clone(&todos), Some(Arc::new(agents)))
        .context("Failed to build the tool set")?;
    info!(model = %config.model.name, tools = tools.len(), "Session ready");

    let system_prompt = match &config.agent.system_prompt {
        Some(prompt) => prompt.clone(),
        None => {
            let cwd = std::env::current_dir().context("Cannot determine working directory")?;
            system_prompt::default_system_prompt(&cwd)
        }
    };

    Ok(
        ConversationOrchestrator::new(gateway, Arc::new(tools), schema, params)
            .with_system_prompt(system_prompt)
            .with_conversation_logger(logger)
            .with_reminder_source(todos),
    )
}

fn conversation_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    let Some(path) = &config.logging.conversation_log else {
        return Arc::new(NoConversationLogger);
    };
    match JsonlConversationLogger::open(path) {
        Ok(logger) => {
            info!(path = %path.display(), "Conversation log enabled");
            Arc::new(logger)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Conversation log disabled");
            Arc::new(NoConversationLogger)
        }
    }
}
