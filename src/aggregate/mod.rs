//! Concurrent fan-out over partitions and reduction into a single total.

use futures::future;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::{Partition, ReportError, Result};
use crate::fetch::PartitionFetcher;

/// Fetch all partitions concurrently and sum every returned count.
///
/// One fetch is dispatched per partition and the reduction waits for all of
/// them; the total is only meaningful once every partition has had a chance
/// to report. A failing fetch is substituted with an empty contribution, so
/// a single unreachable partition lowers the total instead of aborting the
/// cycle. Summation is commutative, so fetch completion order never affects
/// the result.
///
/// # Errors
/// `AggregationCancelled` if cancellation is requested before all fetches
/// complete; partition-local failures never surface as errors.
pub async fn aggregate<F>(
    partitions: &[Partition],
    fetcher: &F,
    token: &CancellationToken,
) -> Result<i64>
where
    F: PartitionFetcher + ?Sized,
{
    let fetches = partitions.iter().map(|partition| async move {
        match fetcher.fetch_votes(partition, token).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("{} contributed nothing: {}", partition, err);
                Vec::new()
            }
        }
    });

    let results = tokio::select! {
        _ = token.cancelled() => return Err(ReportError::AggregationCancelled),
        results = future::join_all(fetches) => results,
    };

    Ok(results
        .into_iter()
        .flatten()
        .map(|entry| entry.value)
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VoteEntry;
    use async_trait::async_trait;

    struct EmptyFetcher;

    #[async_trait]
    impl PartitionFetcher for EmptyFetcher {
        async fn fetch_votes(
            &self,
            _partition: &Partition,
            _token: &CancellationToken,
        ) -> Result<Vec<VoteEntry>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_no_partitions_sums_to_zero() {
        let total = aggregate(&[], &EmptyFetcher, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_empty_partitions_sum_to_zero() {
        let partitions = [Partition::new(0, 99), Partition::new(100, 199)];
        let total = aggregate(&partitions, &EmptyFetcher, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }
}
