//! Configuration file loading for klaude
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `KLAUDE_*` environment variables, `__` separating section and key
//! 2. `--config <path>` specified file
//! 3. Project root: `./klaude.toml` or `./.klaude.toml`
//! 4. Global: `$XDG_CONFIG_HOME/klaude/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentConfig, FileConfig, FileLoggingConfig, FileModelConfig,
    FileToolsConfig, FileWebConfig,
};
pub use loader::ConfigLoader;
