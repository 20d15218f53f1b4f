//! Monitored data domains and their refresh periods.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One monitored data category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Gpu,
    System,
    Models,
    Tokens,
    Config,
}

impl Domain {
    /// Every domain, in panel order
    pub const ALL: [Domain; 5] = [
        Domain::Gpu,
        Domain::System,
        Domain::Models,
        Domain::Tokens,
        Domain::Config,
    ];

    /// Stable lowercase identifier (used in logs)
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Gpu => "gpu",
            Domain::System => "system",
            Domain::Models => "models",
            Domain::Tokens => "tokens",
            Domain::Config => "config",
        }
    }

    /// Operator-facing name used in panel titles and error text
    pub fn title(self) -> &'static str {
        match self {
            Domain::Gpu => "GPU",
            Domain::System => "System",
            Domain::Models => "Models",
            Domain::Tokens => "Token usage",
            Domain::Config => "Servers",
        }
    }

    /// API path serving this domain's envelope
    pub fn endpoint(self) -> &'static str {
        match self {
            Domain::Gpu => "api/gpu/current",
            Domain::System => "api/system/current",
            Domain::Models => "api/models/",
            Domain::Tokens => "api/models/stats/tokens",
            Domain::Config => "api/config/servers",
        }
    }

    /// Effective refresh period: `base × multiplier`
    pub fn period(base: Duration, multiplier: u32) -> Duration {
        base.saturating_mul(multiplier.max(1))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
