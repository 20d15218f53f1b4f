//! Per-domain display regions the scheduler renders into.
//!
//! Each domain owns exactly one region. Rendering one region never touches
//! another, and once the regions are torn down every render is a no-op.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use super::Domain;
use crate::api::{DomainData, ServerConfig};

/// What a domain's panel currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionState {
    /// Nothing rendered yet
    Loading,
    /// Last successful fetch
    Ready {
        data: DomainData,
        updated_at: DateTime<Local>,
    },
    /// Domain-scoped error text replacing the panel contents
    Failed {
        message: String,
        at: DateTime<Local>,
    },
}

/// All domain regions of one dashboard instance.
#[derive(Debug, Clone)]
pub struct DisplayRegions {
    regions: BTreeMap<Domain, RegionState>,
    /// Last server list that rendered successfully; survives a failed refresh
    known_servers: Option<Vec<ServerConfig>>,
    torn_down: bool,
}

impl DisplayRegions {
    pub fn new() -> Self {
        Self {
            regions: Domain::ALL
                .into_iter()
                .map(|d| (d, RegionState::Loading))
                .collect(),
            known_servers: None,
            torn_down: false,
        }
    }

    /// Current state of a domain's region
    pub fn get(&self, domain: Domain) -> &RegionState {
        self.regions.get(&domain).unwrap_or(&RegionState::Loading)
    }

    /// Render fresh data. Returns false if the regions are torn down.
    pub fn render(&mut self, data: DomainData) -> bool {
        if self.torn_down {
            return false;
        }
        let domain = data.domain();
        if let DomainData::Config(ref servers) = data {
            self.known_servers = Some(servers.clone());
        }
        self.regions.insert(
            domain,
            RegionState::Ready {
                data,
                updated_at: Local::now(),
            },
        );
        true
    }

    /// Replace a domain's region with an error message.
    /// Returns false if the regions are torn down.
    pub fn render_error(&mut self, domain: Domain, cause: &str) -> bool {
        if self.torn_down {
            return false;
        }
        self.regions.insert(
            domain,
            RegionState::Failed {
                message: format!("Failed to load {} data: {}", domain.title(), cause),
                at: Local::now(),
            },
        );
        true
    }

    /// Tear down every region; later renders are ignored.
    pub fn tear_down(&mut self) {
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Server list from the last successful config render
    pub fn servers(&self) -> Option<&[ServerConfig]> {
        self.known_servers.as_deref()
    }
}

impl Default for DisplayRegions {
    fn default() -> Self {
        Self::new()
    }
}
