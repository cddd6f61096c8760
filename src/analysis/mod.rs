pub mod anomalies;
pub mod clustering;
pub mod quantiles;
pub mod ranges;
pub mod statistics;

pub use anomalies::{AnomalyDetector, AnomalySet, ThresholdUnit};
pub use clustering::{ClusterAssignment, KMeans};
pub use quantiles::{QuantileBucket, QuantileCut};
pub use ranges::{Range, RangeError, RangeSpec, RangeTable};
pub use statistics::Summary;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No data available: the record set is empty")]
    NoData,

    #[error("Cluster count must be at least 1, got {0}")]
    InvalidClusterCount(usize),
}
