//! Remote data source
//!
//! Each dataset is one HTTP GET returning `{ "data": [ ... ] }`. No query
//! parameters, pagination or auth headers are sent.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::datasets::DatasetKey;
use crate::record::Dataset;
use crate::{Error, Result};

const USER_AGENT: &str = concat!("matriculas/", env!("CARGO_PKG_VERSION"));

/// Fetches a dataset payload by key
///
/// Errors are [`Error::Network`] for transport or status failures and
/// [`Error::Parse`] for bodies that are not a dataset document.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, key: DatasetKey) -> Result<Dataset>;
}

/// Data source backed by the configured webhook endpoints
pub struct HttpDataSource {
    http_client: reqwest::Client,
    endpoints: HashMap<DatasetKey, String>,
}

impl HttpDataSource {
    /// No request timeout is set; the transport default applies
    pub fn new(endpoints: HashMap<DatasetKey, String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            endpoints,
        })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        Self::new(config.endpoint_map())
    }

    pub fn endpoint(&self, key: DatasetKey) -> Option<&str> {
        self.endpoints.get(&key).map(String::as_str)
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self, key: DatasetKey) -> Result<Dataset> {
        let url = self
            .endpoint(key)
            .ok_or_else(|| Error::Config(format!("No endpoint configured for {}", key)))?;

        debug!(dataset = %key, url = %url, "Fetching dataset");

        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!(
                "{} answered HTTP {}",
                url,
                status.as_u16()
            )));
        }

        let body = response.text().await?;
        let dataset: Dataset = serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("{}: {}", key, e)))?;

        debug!(dataset = %key, records = dataset.len(), "Fetched dataset");
        Ok(dataset)
    }
}
