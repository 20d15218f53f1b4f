//! Typed payloads for each monitored domain.
//!
//! Columns the monitoring backend may leave empty are `Option`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FetchError;
use crate::scheduler::Domain;

/// One GPU on one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuSample {
    pub server_name: String,
    pub gpu_index: u32,
    #[serde(default)]
    pub gpu_name: Option<String>,
    #[serde(default)]
    pub utilization_gpu: Option<f64>,
    #[serde(default)]
    pub utilization_memory: Option<f64>,
    /// MB
    #[serde(default)]
    pub memory_total: Option<u64>,
    /// MB
    #[serde(default)]
    pub memory_used: Option<u64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub power_draw: Option<f64>,
    #[serde(default)]
    pub process_count: Option<u32>,
    /// AVAILABLE, BUSY or ERROR
    #[serde(default)]
    pub status: Option<String>,
}

/// Aggregate of a server's GPUs attached to its system snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuSummary {
    pub total_gpus: u32,
    pub available_gpus: u32,
    pub busy_gpus: u32,
    pub avg_gpu_utilization: f64,
    pub avg_memory_utilization: f64,
    pub max_temperature: f64,
}

/// Host-level resource snapshot for one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub server_name: String,
    #[serde(default)]
    pub cpu_count: Option<u32>,
    #[serde(default)]
    pub cpu_usage: Option<f64>,
    #[serde(default)]
    pub load_average: Option<String>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
    #[serde(default)]
    pub disk_percent: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub uptime: Option<u64>,
    /// "online" / "offline"
    #[serde(default)]
    pub server_status: Option<String>,
    #[serde(default)]
    pub gpu_summary: Option<GpuSummary>,
}

impl SystemSnapshot {
    pub fn is_online(&self) -> bool {
        self.server_status.as_deref() == Some("online")
    }
}

/// A configured model service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    pub server_name: String,
    #[serde(default)]
    pub model_type: Option<String>,
    /// RUNNING, STOPPED, STARTING, STOPPING or ERROR
    #[serde(default = "default_model_status")]
    pub status: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

fn default_model_status() -> String {
    "STOPPED".to_string()
}

impl ModelSummary {
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running")
    }
}

/// Fleet-wide token usage aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    pub overview: TokenOverview,
    pub top_models: Vec<TopModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenOverview {
    pub total_running_models: u32,
    pub total_tokens: u64,
    pub total_requests: u64,
    pub avg_tokens_per_request: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopModel {
    pub name: String,
    pub server_name: String,
    pub total_tokens: u64,
    pub total_requests: u64,
}

/// A GPU server as configured on the backend (credentials are never sent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub gpu_count: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub model_path: String,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_enabled() -> bool {
    true
}

/// A decoded payload for one domain.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainData {
    Gpu(Vec<GpuSample>),
    System(Vec<SystemSnapshot>),
    Models(Vec<ModelSummary>),
    Tokens(TokenUsage),
    Config(Vec<ServerConfig>),
}

impl DomainData {
    /// Decode an envelope's `data` value for `domain`.
    pub fn decode(domain: Domain, value: Value) -> Result<Self, FetchError> {
        let data = match domain {
            Domain::Gpu => DomainData::Gpu(serde_json::from_value(value)?),
            Domain::System => DomainData::System(serde_json::from_value(value)?),
            Domain::Models => DomainData::Models(serde_json::from_value(value)?),
            Domain::Tokens => DomainData::Tokens(serde_json::from_value(value)?),
            Domain::Config => DomainData::Config(serde_json::from_value(value)?),
        };
        Ok(data)
    }

    /// Domain this payload belongs to
    pub fn domain(&self) -> Domain {
        match self {
            DomainData::Gpu(_) => Domain::Gpu,
            DomainData::System(_) => Domain::System,
            DomainData::Models(_) => Domain::Models,
            DomainData::Tokens(_) => Domain::Tokens,
            DomainData::Config(_) => Domain::Config,
        }
    }

    /// One-line digest for the `--once` snapshot
    pub fn summary(&self) -> String {
        match self {
            DomainData::Gpu(gpus) => {
                let busy = gpus
                    .iter()
                    .filter(|g| g.status.as_deref() == Some("BUSY"))
                    .count();
                format!("{} GPUs, {busy} busy", gpus.len())
            }
            DomainData::System(systems) => {
                let online = systems.iter().filter(|s| s.is_online()).count();
                format!("{online}/{} servers online", systems.len())
            }
            DomainData::Models(models) => {
                let running = models.iter().filter(|m| m.is_running()).count();
                format!("{running}/{} models running", models.len())
            }
            DomainData::Tokens(usage) => format!(
                "{} tokens over {} requests",
                usage.overview.total_tokens, usage.overview.total_requests
            ),
            DomainData::Config(servers) => {
                let enabled = servers.iter().filter(|s| s.enabled).count();
                format!("{enabled}/{} servers enabled", servers.len())
            }
        }
    }
}
