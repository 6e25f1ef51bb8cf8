//! Model configuration from TOML (`[model]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which model to talk to and where.
///
/// ```toml
/// [model]
/// name = "gpt-4o"
/// base_url = "https://api.openai.com/v1"   # any chat-completions compatible endpoint
/// api_key_env = "OPENAI_API_KEY"           # variable holding the key, not the key
/// temperature = 0.0
/// request_timeout_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    pub name: String,
    pub base_url: String,
    /// Name of the environment variable that holds the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            name: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            request_timeout_secs: 300,
        }
    }
}

impl FileModelConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read the API key from the configured variable. Empty counts as unset.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
