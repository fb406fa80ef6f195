// ============================================================================
// votereport Library
// ============================================================================

pub mod aggregate;
pub mod config;
pub mod core;
pub mod directory;
pub mod fetch;
pub mod scheduler;
pub mod store;
pub mod web;

// Re-export main types for convenience
pub use config::ReportConfig;
pub use core::{NUMBER_OF_VOTES_KEY, Partition, REPORTS_STORE, ReportError, Result, VoteEntry};
pub use store::{ReportStore, StoreTransaction};

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::directory::{HttpDirectory, PartitionDirectory};
use crate::fetch::{GatewayFetcher, PartitionFetcher};

// ============================================================================
// High-level Service API
// ============================================================================

/// Wires the report store, the aggregation loop and the read API together.
///
/// This is the recommended way to embed the aggregator in a host process:
/// construct it from a [`ReportConfig`], spawn the loop, serve the router,
/// and cancel on shutdown.
///
/// # Examples
///
/// ```no_run
/// use votereport::{ReportConfig, ReportService};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ReportConfig::new(
///     "http://localhost:19081",
///     "http://localhost:19080",
///     "/VotingApplication/VotingData",
/// );
///
/// let service = ReportService::new(config)?;
/// let loop_handle = service.spawn();
///
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
/// axum::serve(listener, service.router()).await?;
///
/// service.cancel();
/// loop_handle.await?;
/// # Ok(())
/// # }
/// ```
pub struct ReportService {
    config: ReportConfig,
    store: ReportStore,
    directory: Arc<dyn PartitionDirectory>,
    fetcher: Arc<dyn PartitionFetcher>,
    token: CancellationToken,
}

impl ReportService {
    /// Build a service with HTTP-backed directory and gateway clients.
    ///
    /// When the configuration names a data directory, the store reloads the
    /// last committed snapshot so the read API serves the previous total
    /// across restarts.
    pub fn new(config: ReportConfig) -> Result<Self> {
        config.validate()?;

        let store = match &config.data_dir {
            Some(dir) => ReportStore::open(dir)?,
            None => ReportStore::new(),
        };

        let directory = Arc::new(HttpDirectory::new(&config.directory_base));

        let mut fetcher = GatewayFetcher::new(&config.gateway_base, &config.service_path);
        if let Some(timeout) = config.fetch_timeout {
            fetcher = fetcher.with_timeout(timeout);
        }

        Ok(Self {
            config,
            store,
            directory,
            fetcher: Arc::new(fetcher),
            token: CancellationToken::new(),
        })
    }

    /// Replace the partition directory (e.g. with a `StaticDirectory`).
    pub fn with_directory(mut self, directory: Arc<dyn PartitionDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// Replace the partition fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PartitionFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Handle on the report store (cheap clone, shared state).
    pub fn store(&self) -> ReportStore {
        self.store.clone()
    }

    /// Token that cancels the aggregation loop.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Router serving the read API over this service's store.
    pub fn router(&self) -> axum::Router {
        web::router(self.store.clone())
    }

    /// Spawn the aggregation loop as a background task.
    pub fn spawn(&self) -> JoinHandle<()> {
        let config = self.config.clone();
        let directory = Arc::clone(&self.directory);
        let fetcher = Arc::clone(&self.fetcher);
        let store = self.store.clone();
        let token = self.token.clone();

        tokio::spawn(async move {
            scheduler::run_report_loop(config, directory, fetcher, store, token).await;
        })
    }

    /// Request cooperative shutdown of the aggregation loop.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}
