//! Server configuration
//!
//! Layered with figment, later layers winning:
//! - Built-in defaults
//! - Optional TOML file
//! - `TAVERND_*` environment variables (`__` separates nested keys,
//!   e.g. `TAVERND_ORACLE__API_KEY`)
//!
//! Command-line flags are applied on top by the binaries.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_INVITE_CODE_LENGTH;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TAVERND_";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// SQLite file. None = in-memory.
    pub db_path: Option<String>,
    /// Emit JSON log lines instead of the human format
    pub log_json: bool,
    pub invite_code_length: usize,
    /// Client refresh period of the sync loop
    pub poll_interval_ms: u64,
    pub oracle: OracleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            db_path: None,
            log_json: false,
            invite_code_length: DEFAULT_INVITE_CODE_LENGTH,
            poll_interval_ms: 3000,
            oracle: OracleConfig::default(),
        }
    }
}

/// Oracle (LLM) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// No key = Oracle answers with a configuration notice
    pub api_key: Option<String>,
    /// OpenAI-compatible API root
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Per-caller request budget
    pub requests_per_minute: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.venice.ai/api/v1".to_string(),
            model: "llama-3.3-70b".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 60,
            requests_per_minute: 60,
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then the environment
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract a config from any figment
    pub fn from_figment(figment: &Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    /// Load from defaults, file and environment
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::from_figment(&Self::figment(path))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
