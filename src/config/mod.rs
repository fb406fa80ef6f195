use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::{ReportError, Result};

/// Aggregation service configuration
///
/// Addresses of the external collaborators (partition directory, gateway)
/// plus the timing knobs of the polling cycle.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Base address of the reverse proxy / gateway that routes
    /// partition-keyed requests (e.g. `http://localhost:19081`)
    pub gateway_base: String,

    /// Base address of the partition directory service
    pub directory_base: String,

    /// Path of the source vote service relative to the gateway base
    /// (e.g. `/VotingApplication/VotingData`)
    pub service_path: String,

    /// Delay between aggregation cycles
    pub poll_interval: Duration,

    /// Timeout for a single directory lookup
    pub directory_timeout: Duration,

    /// Optional per-request timeout for partition fetches. `None` leaves the
    /// fetch unbounded, matching the gateway's own request budget.
    pub fetch_timeout: Option<Duration>,

    /// Address the read API listens on
    pub listen_addr: SocketAddr,

    /// Directory for report store snapshots. `None` keeps the store purely
    /// in memory.
    pub data_dir: Option<PathBuf>,
}

impl ReportConfig {
    /// Create a configuration with default timings (one minute poll
    /// interval, ten second directory timeout).
    pub fn new(
        gateway_base: impl Into<String>,
        directory_base: impl Into<String>,
        service_path: impl Into<String>,
    ) -> Self {
        Self {
            gateway_base: gateway_base.into(),
            directory_base: directory_base.into(),
            service_path: service_path.into(),
            poll_interval: Duration::from_secs(60),
            directory_timeout: Duration::from_secs(10),
            fetch_timeout: None,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: None,
        }
    }

    /// Set the delay between aggregation cycles
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the directory lookup timeout
    pub fn directory_timeout(mut self, timeout: Duration) -> Self {
        self.directory_timeout = timeout;
        self
    }

    /// Set a per-request timeout for partition fetches
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Set the read API listen address
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// Enable store snapshots under the given directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.gateway_base.is_empty() {
            return Err(ReportError::ConfigError(
                "gateway_base cannot be empty".to_string(),
            ));
        }

        if self.directory_base.is_empty() {
            return Err(ReportError::ConfigError(
                "directory_base cannot be empty".to_string(),
            ));
        }

        if self.service_path.is_empty() || !self.service_path.starts_with('/') {
            return Err(ReportError::ConfigError(
                "service_path must start with '/'".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(ReportError::ConfigError(
                "poll_interval must be > 0".to_string(),
            ));
        }

        if self.directory_timeout.is_zero() {
            return Err(ReportError::ConfigError(
                "directory_timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
