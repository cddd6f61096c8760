use serde::{Deserialize, Serialize};
use std::fmt;

use crate::traffic::Record;

/// Unit in which the configured anomaly threshold is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdUnit {
    PerBin,
    PerSecond,
    #[default]
    PerMinute,
}

impl fmt::Display for ThresholdUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdUnit::PerBin => write!(f, "per bin"),
            ThresholdUnit::PerSecond => write!(f, "per second"),
            ThresholdUnit::PerMinute => write!(f, "per minute"),
        }
    }
}

/// Scale a threshold in `unit` to packets per bin of `bin_size_secs`.
pub fn threshold_per_bin(threshold: f64, unit: ThresholdUnit, bin_size_secs: u64) -> f64 {
    match unit {
        ThresholdUnit::PerBin => threshold,
        ThresholdUnit::PerSecond => threshold * bin_size_secs as f64,
        ThresholdUnit::PerMinute => threshold * bin_size_secs as f64 / 60.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl AnomalyDetector {
    /// `threshold` is in packets per bin; a record must strictly exceed it.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn with_unit(threshold: f64, unit: ThresholdUnit, bin_size_secs: u64) -> Self {
        Self::new(threshold_per_bin(threshold, unit, bin_size_secs))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_anomalous(&self, packets: u64) -> bool {
        packets as f64 > self.threshold
    }

    pub fn detect(&self, records: &[Record]) -> AnomalySet {
        let records = records
            .iter()
            .filter(|record| self.is_anomalous(record.packets))
            .cloned()
            .collect();
        AnomalySet {
            threshold: self.threshold,
            records,
        }
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::with_unit(1000.0, ThresholdUnit::PerMinute, 60)
    }
}

/// Records above the detector threshold, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySet {
    pub threshold: f64,
    pub records: Vec<Record>,
}

impl AnomalySet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// The `n` largest anomalies by packet count, earliest first on ties.
    pub fn top(&self, n: usize) -> Vec<&Record> {
        let mut sorted: Vec<&Record> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.packets.cmp(&a.packets));
        sorted.truncate(n);
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(packets: &[u64]) -> Vec<Record> {
        let start = NaiveDate::from_ymd_opt(2004, 10, 4)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        packets
            .iter()
            .enumerate()
            .map(|(i, p)| Record::new(start + Duration::minutes(i as i64), *p, None))
            .collect()
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let detector = AnomalyDetector::new(1000.0);
        let anomalies = detector.detect(&series(&[500, 1000, 1001, 2000]));

        let packets: Vec<u64> = anomalies.iter().map(|r| r.packets).collect();
        assert_eq!(packets, vec![1001, 2000]);
        assert!(!detector.is_anomalous(1000));
    }

    #[test]
    fn test_empty_input_yields_empty_set() {
        let anomalies = AnomalyDetector::default().detect(&[]);
        assert!(anomalies.is_empty());
        assert_eq!(anomalies.len(), 0);
    }

    #[test]
    fn test_threshold_units() {
        assert_eq!(threshold_per_bin(1000.0, ThresholdUnit::PerBin, 60), 1000.0);
        assert_eq!(threshold_per_bin(1000.0, ThresholdUnit::PerSecond, 60), 60000.0);
        assert_eq!(threshold_per_bin(1000.0, ThresholdUnit::PerMinute, 60), 1000.0);
        assert_eq!(threshold_per_bin(1000.0, ThresholdUnit::PerMinute, 300), 5000.0);
        assert_eq!(AnomalyDetector::default().threshold(), 1000.0);
    }

    #[test]
    fn test_top_orders_by_packets() {
        let detector = AnomalyDetector::new(10.0);
        let anomalies = detector.detect(&series(&[50, 20, 90, 5, 20, 70]));

        let top: Vec<u64> = anomalies.top(3).iter().map(|r| r.packets).collect();
        assert_eq!(top, vec![90, 70, 50]);
        assert_eq!(anomalies.top(10).len(), 5);
    }

    #[test]
    fn test_detection_keeps_input_order() {
        let records = series(&[3000, 10, 2000]);
        let anomalies = AnomalyDetector::new(1000.0).detect(&records);
        assert_eq!(anomalies.records, vec![records[0].clone(), records[2].clone()]);
    }
}
