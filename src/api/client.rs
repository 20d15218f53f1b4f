//! HTTP client for the monitoring API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::envelope::Envelope;
use super::types::DomainData;
use super::FetchError;
use crate::scheduler::Domain;

/// Something that can produce one domain's current data.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Issue one request for `domain` and decode its envelope.
    async fn fetch(&self, domain: Domain) -> Result<DomainData, FetchError>;
}

/// `DataSource` backed by the monitoring API over HTTP.
pub struct HttpDataSource {
    client: Client,
    base_url: Url,
}

impl HttpDataSource {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
        })
    }

    /// Absolute URL of a domain's endpoint
    pub fn endpoint(&self, domain: Domain) -> Result<Url, FetchError> {
        self.base_url
            .join(domain.endpoint())
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self, domain: Domain) -> Result<DomainData, FetchError> {
        let url = self.endpoint(domain)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let envelope: Envelope = response.json().await?;
        DomainData::decode(domain, envelope.into_data()?)
    }
}

/// `Url::join` replaces the last segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
