//! Tool implementations for the agent
//!
//! Every tool is a struct implementing [`klaude_domain::Tool`], built once per
//! session and registered in a [`ToolRegistry`]. Tools that carry state own
//! it: Bash its working directory and environment snapshot, TodoWrite a
//! shared [`TodoStore`], WebFetch its page cache.
//!
//! | Module | Tools |
//! |--------|-------|
//! | [`task`] | Task |
//! | [`command`] | Bash |
//! | [`search`] | Glob, Grep |
//! | [`list`] | LS |
//! | [`file`] | Read, Write |
//! | [`edit`] | Edit, MultiEdit |
//! | [`notebook`] | NotebookRead, NotebookEdit |
//! | [`web`] | WebFetch, WebSearch |
//! | [`todo`] | TodoWrite |

pub mod command;
pub mod edit;
pub mod file;
pub mod list;
pub mod notebook;
pub mod output;
pub mod search;
pub mod task;
pub mod todo;
pub mod web;

mod fs_util;
mod registry;
mod schema;

pub use command::BashTool;
pub use edit::{EditTool, MultiEditTool};
pub use file::{ReadTool, WriteTool};
pub use list::ListTool;
pub use notebook::{NotebookEditTool, NotebookReadTool};
pub use registry::ToolRegistry;
pub use schema::JsonSchemaToolConverter;
pub use search::{GlobTool, GrepTool};
pub use task::TaskTool;
pub use todo::{TodoStore, TodoWriteTool};
pub use web::{DuckDuckGoBackend, HttpPageFetcher, WebFetchTool, WebSearchTool};

use klaude_application::SubAgentPort;
use std::sync::Arc;
use std::time::Duration;

/// Knobs for the stateful tools, usually taken from the `[tools]` and `[web]`
/// config sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub bash_default_timeout_ms: u64,
    pub bash_max_timeout_ms: u64,
    pub grep_binary: String,
    pub prefer_external_grep: bool,
    pub fetch_blocked_domains: Vec<String>,
    pub web_timeout: Duration,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            bash_default_timeout_ms: command::DEFAULT_TIMEOUT_MS,
            bash_max_timeout_ms: command::MAX_TIMEOUT_MS,
            grep_binary: "rg".to_string(),
            prefer_external_grep: true,
            fetch_blocked_domains: Vec::new(),
            web_timeout: Duration::from_secs(30),
        }
    }
}

/// Build the standard tool set.
///
/// Task is registered first when `agents` is given; pass `None` for the
/// registry a sub-agent runs with, so delegation stays one level deep.
pub fn default_registry(
    settings: &ToolSettings,
    todos: Arc<TodoStore>,
    agents: Option<Arc<dyn SubAgentPort>>,
) -> Result<ToolRegistry, reqwest::Error> {
    let fetcher = Arc::new(HttpPageFetcher::new(settings.web_timeout)?);
    let search = Arc::new(DuckDuckGoBackend::new(settings.web_timeout)?);

    let mut registry = ToolRegistry::new();
    if let Some(agents) = agents {
        registry.register(TaskTool::new(agents));
    }
    registry
        .register(
            BashTool::new()
                .with_timeouts(settings.bash_default_timeout_ms, settings.bash_max_timeout_ms),
        )
        .register(GlobTool::new())
        .register(
            GrepTool::new()
                .with_binary(settings.grep_binary.clone())
                .prefer_external(settings.prefer_external_grep),
        )
        .register(ListTool::new())
        .register(ReadTool::new())
        .register(EditTool::new())
        .register(MultiEditTool::new())
        .register(WriteTool::new())
        .register(NotebookReadTool::new())
        .register(NotebookEditTool::new())
        .register(
            WebFetchTool::new(fetcher).with_blocked_domains(settings.fetch_blocked_domains.clone()),
        )
        .register(TodoWriteTool::new(todos))
        .register(WebSearchTool::new(search));

    tracing::debug!(tools = registry.len(), "Tool registry ready");
    Ok(registry)
}
