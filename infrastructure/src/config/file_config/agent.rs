//! Agent configuration from TOML (`[agent]` section)

use serde::{Deserialize, Serialize};

/// Raw agent configuration from TOML
///
/// # Example
///
/// ```toml
/// [agent]
/// max_tool_turns = 50          # tool rounds per user message
/// max_parallel_tools = 8       # concurrent tool calls within one round
/// system_prompt = "..."        # replaces the built-in prompt
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub max_tool_turns: usize,
    pub max_parallel_tools: usize,
    pub system_prompt: Option<String>,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            max_tool_turns: 50,
            max_parallel_tools: 8,
            system_prompt: None,
        }
    }
}
