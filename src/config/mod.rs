//! Configuration management for gpudash.
//!
//! Handles loading of the data-source address, refresh cadences, terminal
//! bridge limits and logging preferences.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::scheduler::Domain;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data-source server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Refresh scheduler settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Terminal bridge settings
    #[serde(default)]
    pub terminal: TerminalConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults. The result is always validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate();
        Ok(config)
    }

    /// Clamp every section to its valid range
    pub fn validate(&mut self) {
        self.server.request_timeout_secs = self.server.request_timeout_secs.max(1);
        self.refresh.validate();
        self.terminal.validate();
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;

        Ok(config_dir.join("gpudash").join("config.toml"))
    }

    /// Websocket endpoint for a terminal session against `server`.
    ///
    /// The server identifier is appended as a single percent-encoded path segment.
    pub fn terminal_endpoint(&self, server: &str) -> Result<Url> {
        let mut url = self.server.base_url.clone();
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|()| anyhow::anyhow!("Cannot derive websocket URL from {}", self.server.base_url))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| anyhow::anyhow!("Base URL cannot carry a path: {}", self.server.base_url))?;
            segments.pop_if_empty();
            segments.extend(
                self.terminal
                    .endpoint_path
                    .split('/')
                    .filter(|s| !s.is_empty()),
            );
            segments.push(server);
        }

        Ok(url)
    }
}

/// Data-source server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the monitoring API
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Per-request timeout for domain fetches
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> Url {
    Url::parse("http://127.0.0.1:8088").expect("static URL is valid")
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Refresh scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Shared base period in milliseconds
    #[serde(default = "default_base_interval")]
    pub base_interval_ms: u64,

    /// Stop refreshing while the terminal window is unfocused
    #[serde(default = "default_true")]
    pub pause_when_unfocused: bool,

    /// Per-domain cadence multipliers
    #[serde(default)]
    pub cadence: CadenceConfig,
}

fn default_base_interval() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

/// Lower bound for the base interval (500ms)
const MIN_BASE_INTERVAL_MS: u64 = 500;

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: default_base_interval(),
            pause_when_unfocused: true,
            cadence: CadenceConfig::default(),
        }
    }
}

impl RefreshConfig {
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    pub fn validate(&mut self) {
        self.base_interval_ms = self.base_interval_ms.max(MIN_BASE_INTERVAL_MS);
        self.cadence.validate();
    }
}

/// Cadence multipliers, one per domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default = "one")]
    pub gpu: u32,
    #[serde(default = "one")]
    pub system: u32,
    #[serde(default = "two")]
    pub models: u32,
    #[serde(default = "two")]
    pub tokens: u32,
    #[serde(default = "six")]
    pub config: u32,
}

fn one() -> u32 {
    1
}

fn two() -> u32 {
    2
}

fn six() -> u32 {
    6
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            gpu: 1,
            system: 1,
            models: 2,
            tokens: 2,
            config: 6,
        }
    }
}

impl CadenceConfig {
    /// Multiplier for a domain
    pub fn multiplier(&self, domain: Domain) -> u32 {
        match domain {
            Domain::Gpu => self.gpu,
            Domain::System => self.system,
            Domain::Models => self.models,
            Domain::Tokens => self.tokens,
            Domain::Config => self.config,
        }
    }

    /// Multipliers must be positive
    pub fn validate(&mut self) {
        for m in [
            &mut self.gpu,
            &mut self.system,
            &mut self.models,
            &mut self.tokens,
            &mut self.config,
        ] {
            *m = (*m).max(1);
        }
    }
}

/// Terminal bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Path prefix of the terminal websocket endpoint
    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: String,

    /// Quiet period before a burst of viewport changes produces a resize frame
    #[serde(default = "default_resize_delay")]
    pub resize_delay_ms: u64,

    /// How long a session survives while the console is hidden
    #[serde(default = "default_hidden_grace")]
    pub hidden_grace_secs: u64,

    /// Rendered lines retained before eviction
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Lines evicted in one batch once `max_lines` is exceeded
    #[serde(default = "default_evict_batch")]
    pub evict_batch: usize,
}

fn default_endpoint_path() -> String {
    "/ws/terminal/".to_string()
}

fn default_resize_delay() -> u64 {
    100
}

fn default_hidden_grace() -> u64 {
    600
}

fn default_max_lines() -> usize {
    1000
}

fn default_evict_batch() -> usize {
    100
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            endpoint_path: default_endpoint_path(),
            resize_delay_ms: default_resize_delay(),
            hidden_grace_secs: default_hidden_grace(),
            max_lines: default_max_lines(),
            evict_batch: default_evict_batch(),
        }
    }
}

impl TerminalConfig {
    pub fn resize_delay(&self) -> Duration {
        Duration::from_millis(self.resize_delay_ms)
    }

    pub fn hidden_grace(&self) -> Duration {
        Duration::from_secs(self.hidden_grace_secs)
    }

    pub fn validate(&mut self) {
        self.max_lines = self.max_lines.max(10);
        self.evict_batch = self.evict_batch.clamp(1, self.max_lines);
    }
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file; defaults to `<data_local_dir>/gpudash/gpudash.log`
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "gpudash=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Resolve the log file location
    pub fn file_path(&self) -> Result<PathBuf> {
        if let Some(ref file) = self.file {
            return Ok(file.clone());
        }
        let data_dir = dirs::data_local_dir().context("Could not find data directory")?;
        Ok(data_dir.join("gpudash").join("gpudash.log"))
    }
}
