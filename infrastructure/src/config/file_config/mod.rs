//! Raw TOML configuration data types
//!
//! These structs mirror the config file layout one section per module. Every
//! field has a default, so a partial file (or none at all) deserializes.

mod agent;
mod logging;
mod model;
mod tools;
mod web;

pub use agent::FileAgentConfig;
pub use logging::FileLoggingConfig;
pub use model::FileModelConfig;
pub use tools::FileToolsConfig;
pub use web::FileWebConfig;

use crate::tools::ToolSettings;
use klaude_application::ExecutionParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration values that load fine but cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("model.name cannot be empty")]
    EmptyModelName,

    #[error("{0} cannot be 0")]
    Zero(&'static str),

    #[error(
        "tools.bash_default_timeout_ms ({default}) exceeds tools.bash_max_timeout_ms ({max})"
    )]
    BashTimeoutsInverted { default: u64, max: u64 },

    #[error("model.temperature must be between 0 and 2, got {0}")]
    Temperature(String),
}

/// Complete file configuration (raw TOML structure)
///
/// ```toml
/// [model]
/// name = "gpt-4o"
///
/// [agent]
/// max_parallel_tools = 4
///
/// [tools]
/// prefer_external_grep = false
///
/// [web]
/// fetch_blocked_domains = ["internal.example.com"]
///
/// [logging]
/// conversation_log = "~/.local/state/klaude/conversation.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub model: FileModelConfig,
    pub agent: FileAgentConfig,
    pub tools: FileToolsConfig,
    pub web: FileWebConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Check values that deserialize but make no sense at runtime.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.model.name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigValidationError::Temperature(
                self.model.temperature.to_string(),
            ));
        }
        if self.model.request_timeout_secs == 0 {
            return Err(ConfigValidationError::Zero("model.request_timeout_secs"));
        }
        if self.agent.max_tool_turns == 0 {
            return Err(ConfigValidationError::Zero("agent.max_tool_turns"));
        }
        if self.tools.bash_default_timeout_ms == 0 {
            return Err(ConfigValidationError::Zero("tools.bash_default_timeout_ms"));
        }
        if self.tools.bash_default_timeout_ms > self.tools.bash_max_timeout_ms {
            return Err(ConfigValidationError::BashTimeoutsInverted {
                default: self.tools.bash_default_timeout_ms,
                max: self.tools.bash_max_timeout_ms,
            });
        }
        if self.web.request_timeout_secs == 0 {
            return Err(ConfigValidationError::Zero("web.request_timeout_secs"));
        }
        Ok(())
    }

    /// Settings for the stateful tools.
    pub fn tool_settings(&self) -> ToolSettings {
        ToolSettings {
            bash_default_timeout_ms: self.tools.bash_default_timeout_ms,
            bash_max_timeout_ms: self.tools.bash_max_timeout_ms,
            grep_binary: self.tools.grep_binary.clone(),
            prefer_external_grep: self.tools.prefer_external_grep,
            fetch_blocked_domains: self.web.fetch_blocked_domains.clone(),
            web_timeout: Duration::from_secs(self.web.request_timeout_secs),
        }
    }

    /// Conversation loop bounds.
    pub fn execution_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_max_tool_turns(self.agent.max_tool_turns)
            .with_max_parallel_tools(self.agent.max_parallel_tools)
    }
}
