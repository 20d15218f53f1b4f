//! In-memory data source for scheduler and lifecycle tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{DataSource, DomainData, FetchError};
use crate::scheduler::Domain;

/// Scripted outcome for one domain.
#[derive(Debug, Clone)]
pub enum Scripted {
    Data(DomainData),
    Rejected(String),
}

/// Data source that answers from a per-domain script and counts calls.
#[derive(Clone, Default)]
pub struct FakeDataSource {
    script: Arc<Mutex<HashMap<Domain, Scripted>>>,
    calls: Arc<Mutex<HashMap<Domain, usize>>>,
}

impl FakeDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `domain` with `data` from now on.
    pub fn respond(&self, domain: Domain, data: DomainData) {
        self.script
            .lock()
            .unwrap()
            .insert(domain, Scripted::Data(data));
    }

    /// Answer `domain` with `{success: false, message}` from now on.
    pub fn reject(&self, domain: Domain, message: &str) {
        self.script
            .lock()
            .unwrap()
            .insert(domain, Scripted::Rejected(message.to_string()));
    }

    /// Number of fetches issued for `domain`
    pub fn calls(&self, domain: Domain) -> usize {
        self.calls.lock().unwrap().get(&domain).copied().unwrap_or(0)
    }

    /// Script every domain with an empty successful payload.
    pub fn with_empty_data() -> Self {
        let fake = Self::new();
        for domain in Domain::ALL {
            fake.respond(domain, empty(domain));
        }
        fake
    }
}

/// Empty successful payload for `domain`
pub fn empty(domain: Domain) -> DomainData {
    match domain {
        Domain::Gpu => DomainData::Gpu(Vec::new()),
        Domain::System => DomainData::System(Vec::new()),
        Domain::Models => DomainData::Models(Vec::new()),
        Domain::Tokens => DomainData::Tokens(Default::default()),
        Domain::Config => DomainData::Config(Vec::new()),
    }
}

#[async_trait]
impl DataSource for FakeDataSource {
    async fn fetch(&self, domain: Domain) -> Result<DomainData, FetchError> {
        *self.calls.lock().unwrap().entry(domain).or_insert(0) += 1;
        let scripted = self.script.lock().unwrap().get(&domain).cloned();
        match scripted {
            Some(Scripted::Data(data)) => Ok(data),
            Some(Scripted::Rejected(message)) => Err(FetchError::Rejected(message)),
            None => Err(FetchError::MissingData),
        }
    }
}
