//! Tool configuration from TOML (`[tools]` section)

use serde::{Deserialize, Serialize};

/// ```toml
/// [tools]
/// bash_default_timeout_ms = 120000
/// bash_max_timeout_ms = 600000
/// grep_binary = "rg"
/// prefer_external_grep = true   # false always uses the built-in matcher
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    pub bash_default_timeout_ms: u64,
    pub bash_max_timeout_ms: u64,
    pub grep_binary: String,
    pub prefer_external_grep: bool,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            bash_default_timeout_ms: 120_000,
            bash_max_timeout_ms: 600_000,
            grep_binary: "rg".to_string(),
            prefer_external_grep: true,
        }
    }
}
