//! Per-partition vote fetches through the gateway.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::{Partition, ReportError, Result, VoteEntry};

/// Fetches the (key, count) pairs one partition currently holds.
#[async_trait]
pub trait PartitionFetcher: Send + Sync {
    /// Perform one fetch against the given partition.
    ///
    /// A non-success response is not an error: the partition simply
    /// contributes no data and an empty sequence is returned. Network-level
    /// failures (timeout, connection error, undecodable body) surface as
    /// `FetchFailed` and are absorbed by the aggregator.
    async fn fetch_votes(
        &self,
        partition: &Partition,
        token: &CancellationToken,
    ) -> Result<Vec<VoteEntry>>;
}

/// Build the partition-keyed vote data address.
///
/// The partition kind is fixed to the numeric-range scheme used by the
/// source service.
pub fn vote_data_url(gateway_base: &str, service_path: &str, low_key: i64) -> String {
    format!(
        "{}{}/api/VoteData?PartitionKey={}&PartitionKind=Int64Range",
        gateway_base, service_path, low_key
    )
}

/// Fetcher that routes requests through the reverse proxy / gateway, keyed
/// by the partition's low key.
pub struct GatewayFetcher {
    gateway_base: String,
    service_path: String,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

impl GatewayFetcher {
    pub fn new(gateway_base: impl Into<String>, service_path: impl Into<String>) -> Self {
        Self {
            gateway_base: gateway_base.into(),
            service_path: service_path.into(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Bound each fetch request. Without a timeout the request runs on the
    /// gateway's own budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl PartitionFetcher for GatewayFetcher {
    async fn fetch_votes(
        &self,
        partition: &Partition,
        token: &CancellationToken,
    ) -> Result<Vec<VoteEntry>> {
        let url = vote_data_url(&self.gateway_base, &self.service_path, partition.low_key);

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = tokio::select! {
            _ = token.cancelled() => {
                return Err(ReportError::FetchFailed("fetch cancelled".to_string()));
            }
            response = request.send() => {
                response.map_err(|e| ReportError::FetchFailed(e.to_string()))?
            }
        };

        // A degraded or missing partition must never abort the aggregation:
        // any non-success status means "no data from this partition".
        if !response.status().is_success() {
            debug!("{} returned {}, treating as empty", partition, response.status());
            return Ok(Vec::new());
        }

        response
            .json::<Vec<VoteEntry>>()
            .await
            .map_err(|e| ReportError::FetchFailed(e.to_string()))
    }
}
