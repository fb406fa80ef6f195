use serde::{Deserialize, Serialize};

/// Name of the store that holds aggregate reports.
pub const REPORTS_STORE: &str = "reports";

/// Key under which the vote total is stored.
pub const NUMBER_OF_VOTES_KEY: &str = "NumberOfvotes";

/// A shard of the source vote service, addressed by a numeric key range.
///
/// Partitions are discovered fresh on every aggregation cycle; nothing about
/// them is cached across cycles, so splits and merges in the source service
/// are absorbed transparently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Lower bound of the partition's key range. Used as the routing
    /// parameter when addressing the gateway.
    pub low_key: i64,

    /// Upper bound of the partition's key range.
    #[serde(default)]
    pub high_key: i64,
}

impl Partition {
    pub fn new(low_key: i64, high_key: i64) -> Self {
        Self { low_key, high_key }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "partition[{}..{}]", self.low_key, self.high_key)
    }
}

/// A (identifier, count) pair reported by a single partition.
///
/// The same identifier may appear in the results of several partitions; the
/// aggregate is the sum of all counts, entries are never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEntry {
    #[serde(alias = "Key")]
    pub key: String,

    #[serde(alias = "Value")]
    pub value: i64,
}

impl VoteEntry {
    pub fn new(key: impl Into<String>, value: i64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}
