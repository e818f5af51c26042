//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (handled by each binary with clap, including
//!    environment variable fallbacks)
//! 2. TOML configuration file
//! 3. Built-in defaults
//!
//! A missing configuration file is not an error: the module logs it and
//! starts with defaults. A file that exists but cannot be parsed is.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{Error, Result};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "jukebox";

/// Logging section shared by every module's TOML file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive used when RUST_LOG is not set, e.g. `jukebox_client=info`
    pub fn default_directive(&self, target: &str) -> String {
        format!("{}={}", target, self.level)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default configuration file for a module
///
/// `~/.config/jukebox/<module>.toml` on Linux, the equivalent per-user
/// config directory elsewhere.
pub fn default_config_path(module: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(format!("{}.toml", module)))
}

/// Load a module's TOML configuration
///
/// - `explicit`: a path given on the command line. It must exist.
/// - Otherwise the default path is tried; if absent, `T::default()` is used.
pub fn load_config<T>(explicit: Option<&Path>, module: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return parse_file(path);
    }

    match default_config_path(module) {
        Some(path) if path.exists() => parse_file(&path),
        Some(path) => {
            info!(
                "No config file at {}, using built-in defaults",
                path.display()
            );
            Ok(T::default())
        }
        None => {
            info!("No platform config directory, using built-in defaults");
            Ok(T::default())
        }
    }
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Loading config file {}", path.display());
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_default() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.default_directive("jukebox_server"), "jukebox_server=info");
    }

    #[test]
    fn test_default_config_path_names_module() {
        if let Some(path) = default_config_path("client") {
            assert!(path.ends_with("jukebox/client.toml"));
        }
    }
}
