pub mod error;
pub mod types;

pub use error::{ReportError, Result};
pub use types::{NUMBER_OF_VOTES_KEY, Partition, REPORTS_STORE, VoteEntry};
