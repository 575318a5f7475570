//! Application configuration for the IndexNow submitter.
//!
//! User config lives at `~/.indexnow/indexnow.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IndexNowError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "indexnow.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".indexnow";

/// User-Agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("indexnow/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Config structs (matching indexnow.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Provider submission settings.
    #[serde(default)]
    pub submission: SubmissionConfig,
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Override for the User-Agent header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// `[submission]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Provider names to submit to. Empty means all built-in providers.
    #[serde(default)]
    pub providers: Vec<String>,

    /// Keep submitting to other providers when one is unreachable.
    #[serde(default)]
    pub keep_going: bool,
}

// ---------------------------------------------------------------------------
// Client config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ClientConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.http.timeout_secs,
            user_agent: config
                .http
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.indexnow/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| IndexNowError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.indexnow/indexnow.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| IndexNowError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        IndexNowError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    tracing::debug!(?path, "loaded config file");
    Ok(config)
}
