/// Aggregation tests
///
/// Fan-out, partial-failure tolerance and order independence of the
/// aggregate reduction.
/// Run with: cargo test --test aggregation_tests
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use votereport::aggregate::aggregate;
use votereport::fetch::PartitionFetcher;
use votereport::{Partition, ReportError, VoteEntry};

/// Fetcher scripted per partition low key. A missing script entry behaves
/// like a degraded partition (empty result); `Err` scripts return
/// `FetchFailed`.
struct ScriptedFetcher {
    responses: HashMap<i64, std::result::Result<Vec<VoteEntry>, String>>,
    /// Per-partition artificial latency, to scramble completion order.
    delays: HashMap<i64, Duration>,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            delays: HashMap::new(),
        }
    }

    fn entries(mut self, low_key: i64, entries: Vec<VoteEntry>) -> Self {
        self.responses.insert(low_key, Ok(entries));
        self
    }

    fn failure(mut self, low_key: i64, reason: &str) -> Self {
        self.responses.insert(low_key, Err(reason.to_string()));
        self
    }

    fn delay(mut self, low_key: i64, delay: Duration) -> Self {
        self.delays.insert(low_key, delay);
        self
    }
}

#[async_trait]
impl PartitionFetcher for ScriptedFetcher {
    async fn fetch_votes(
        &self,
        partition: &Partition,
        _token: &CancellationToken,
    ) -> votereport::Result<Vec<VoteEntry>> {
        if let Some(delay) = self.delays.get(&partition.low_key) {
            tokio::time::sleep(*delay).await;
        }

        match self.responses.get(&partition.low_key) {
            Some(Ok(entries)) => Ok(entries.clone()),
            Some(Err(reason)) => Err(ReportError::FetchFailed(reason.clone())),
            None => Ok(Vec::new()),
        }
    }
}

fn two_partitions() -> Vec<Partition> {
    vec![Partition::new(0, 99), Partition::new(100, 199)]
}

#[tokio::test]
async fn test_total_is_sum_across_partitions() {
    let fetcher = ScriptedFetcher::new()
        .entries(0, vec![VoteEntry::new("a", 3), VoteEntry::new("b", 5)])
        .entries(100, vec![VoteEntry::new("c", 2)]);

    let total = aggregate(&two_partitions(), &fetcher, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(total, 10);
}

#[tokio::test]
async fn test_shared_keys_are_summed_not_deduplicated() {
    // The same identifier reported by two partitions counts twice.
    let fetcher = ScriptedFetcher::new()
        .entries(0, vec![VoteEntry::new("a", 3)])
        .entries(100, vec![VoteEntry::new("a", 4)]);

    let total = aggregate(&two_partitions(), &fetcher, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(total, 7);
}

#[tokio::test]
async fn test_failed_partition_contributes_nothing() {
    let fetcher = ScriptedFetcher::new()
        .failure(0, "connection refused")
        .entries(100, vec![VoteEntry::new("c", 2)]);

    let total = aggregate(&two_partitions(), &fetcher, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_all_partitions_failing_sums_to_zero() {
    let fetcher = ScriptedFetcher::new()
        .failure(0, "timeout")
        .failure(100, "timeout");

    let total = aggregate(&two_partitions(), &fetcher, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_completion_order_does_not_change_total() {
    let partitions = vec![
        Partition::new(0, 99),
        Partition::new(100, 199),
        Partition::new(200, 299),
    ];

    // First partition finishes last, last finishes first.
    let slow_first = ScriptedFetcher::new()
        .entries(0, vec![VoteEntry::new("a", 1)])
        .delay(0, Duration::from_millis(50))
        .entries(100, vec![VoteEntry::new("b", 2)])
        .delay(100, Duration::from_millis(20))
        .entries(200, vec![VoteEntry::new("c", 4)]);

    let slow_last = ScriptedFetcher::new()
        .entries(0, vec![VoteEntry::new("a", 1)])
        .entries(100, vec![VoteEntry::new("b", 2)])
        .delay(100, Duration::from_millis(20))
        .entries(200, vec![VoteEntry::new("c", 4)])
        .delay(200, Duration::from_millis(50));

    let token = CancellationToken::new();
    let total_a = aggregate(&partitions, &slow_first, &token).await.unwrap();
    let total_b = aggregate(&partitions, &slow_last, &token).await.unwrap();

    assert_eq!(total_a, 7);
    assert_eq!(total_a, total_b);
}

#[tokio::test]
async fn test_cancellation_before_barrier_abandons_aggregation() {
    let fetcher = ScriptedFetcher::new()
        .entries(0, vec![VoteEntry::new("a", 1)])
        .delay(0, Duration::from_secs(30));
    let partitions = vec![Partition::new(0, 99)];
    let token = CancellationToken::new();

    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    let result = aggregate(&partitions, &fetcher, &token).await;
    assert!(matches!(result, Err(ReportError::AggregationCancelled)));
}
