//! Web tool configuration from TOML (`[web]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWebConfig {
    /// Hosts WebFetch refuses, subdomains included
    pub fetch_blocked_domains: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for FileWebConfig {
    fn default() -> Self {
        Self {
            fetch_blocked_domains: Vec::new(),
            request_timeout_secs: 30,
        }
    }
}
