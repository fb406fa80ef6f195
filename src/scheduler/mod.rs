//! The aggregation cycle: discover -> fetch -> aggregate -> persist -> sleep.

use std::sync::Arc;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::config::ReportConfig;
use crate::core::{NUMBER_OF_VOTES_KEY, REPORTS_STORE, ReportError, Result};
use crate::directory::PartitionDirectory;
use crate::fetch::PartitionFetcher;
use crate::store::{ReportStore, take_new};

/// Drive aggregation cycles until cancellation.
///
/// No failure inside a cycle is fatal: discovery, fetch and persist errors
/// all abandon the current cycle, leave the stored total untouched and retry
/// after the normal poll interval. Only cancellation ends the loop, and it
/// does so without error. Cycles are strictly sequential; the next one never
/// starts before the current sleep completes.
pub async fn run_report_loop(
    config: ReportConfig,
    directory: Arc<dyn PartitionDirectory>,
    fetcher: Arc<dyn PartitionFetcher>,
    store: ReportStore,
    token: CancellationToken,
) {
    info!(
        "Report loop started; polling every {:?}",
        config.poll_interval
    );

    loop {
        if token.is_cancelled() {
            break;
        }

        match run_cycle(
            &config,
            directory.as_ref(),
            fetcher.as_ref(),
            &store,
            &token,
        )
        .await
        {
            Ok(total) => info!("Committed total {} under '{}'", total, NUMBER_OF_VOTES_KEY),
            Err(ReportError::AggregationCancelled) => break,
            Err(err) => {
                if token.is_cancelled() {
                    break;
                }
                warn!("Cycle abandoned, retrying next interval: {}", err);
            }
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = sleep(config.poll_interval) => {}
        }
    }

    info!("Report loop stopped");
}

/// One full cycle. Cancellation is re-checked after every suspension point.
async fn run_cycle(
    config: &ReportConfig,
    directory: &dyn PartitionDirectory,
    fetcher: &dyn PartitionFetcher,
    store: &ReportStore,
    token: &CancellationToken,
) -> Result<i64> {
    let partitions = directory
        .list_partitions(&config.service_path, config.directory_timeout, token)
        .await?;
    if token.is_cancelled() {
        return Err(ReportError::AggregationCancelled);
    }
    debug!("Discovered {} partitions", partitions.len());

    let total = aggregate(&partitions, fetcher, token).await?;
    if token.is_cancelled() {
        return Err(ReportError::AggregationCancelled);
    }

    store
        .with_transaction(|tx| tx.upsert(REPORTS_STORE, NUMBER_OF_VOTES_KEY, total, take_new))
        .await?;

    Ok(total)
}
