//! Client side of the monitoring API: envelopes, typed payloads and the
//! data-source seam used by the refresh scheduler.

pub mod client;
pub mod envelope;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{DataSource, HttpDataSource};
pub use envelope::Envelope;
pub use types::{
    DomainData, GpuSample, GpuSummary, ModelSummary, ServerConfig, SystemSnapshot, TokenUsage,
};

/// Why a domain fetch produced no data.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Rejected(String),

    #[error("response carried no data")]
    MissingData,

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}
