//! Partition discovery for the sharded source service.
//!
//! The aggregation cycle never caches partition identity: every cycle asks
//! the directory for a fresh snapshot, so topology changes in the source
//! service (splits, merges) are picked up on the next cycle without any
//! coordination.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::{Partition, ReportError, Result};

/// Resolves the logical address of the source service into its current list
/// of partitions and their key ranges.
#[async_trait]
pub trait PartitionDirectory: Send + Sync {
    /// List the partitions of the service at `service_path`.
    ///
    /// Must complete within `timeout` or fail with `DirectoryTimeout`; a
    /// directory that cannot be reached fails with `DirectoryUnavailable`.
    /// Both are recoverable, cycle-ending failures for the caller.
    async fn list_partitions(
        &self,
        service_path: &str,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Result<Vec<Partition>>;
}

/// Directory client backed by an HTTP partition-directory endpoint.
///
/// Queries `GET {base}/partitions?service={service_path}` and expects a JSON
/// array of partition descriptors.
pub struct HttpDirectory {
    base: String,
    client: reqwest::Client,
}

impl HttpDirectory {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PartitionDirectory for HttpDirectory {
    async fn list_partitions(
        &self,
        service_path: &str,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Result<Vec<Partition>> {
        let request = self
            .client
            .get(format!("{}/partitions", self.base))
            .query(&[("service", service_path)])
            .timeout(timeout)
            .send();

        let response = tokio::select! {
            _ = token.cancelled() => {
                return Err(ReportError::DirectoryUnavailable(
                    "directory lookup cancelled".to_string(),
                ));
            }
            response = request => response.map_err(|e| {
                if e.is_timeout() {
                    ReportError::DirectoryTimeout(timeout)
                } else {
                    ReportError::DirectoryUnavailable(e.to_string())
                }
            })?,
        };

        if !response.status().is_success() {
            return Err(ReportError::DirectoryUnavailable(format!(
                "directory returned {}",
                response.status()
            )));
        }

        response
            .json::<Vec<Partition>>()
            .await
            .map_err(|e| ReportError::DirectoryUnavailable(e.to_string()))
    }
}

/// Directory with a fixed partition snapshot.
///
/// Useful for single-node deployments and as a test double.
pub struct StaticDirectory {
    partitions: Vec<Partition>,
}

impl StaticDirectory {
    pub fn new(partitions: Vec<Partition>) -> Self {
        Self { partitions }
    }
}

#[async_trait]
impl PartitionDirectory for StaticDirectory {
    async fn list_partitions(
        &self,
        _service_path: &str,
        _timeout: Duration,
        _token: &CancellationToken,
    ) -> Result<Vec<Partition>> {
        Ok(self.partitions.clone())
    }
}
