use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisError;
use crate::traffic::Record;

/// Packet statistics over one batch of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub record_count: usize,
    pub total_packets: u64,
    /// Sum over the records that carry a byte count.
    pub total_bytes: u64,
    pub mean_packets: f64,
    pub max_packets: u64,
    pub min_packets: u64,
    /// Sample standard deviation (n - 1); `None` below two records.
    pub std_dev_packets: Option<f64>,
    pub first_timestamp: NaiveDateTime,
    pub last_timestamp: NaiveDateTime,
}

impl Summary {
    pub fn from_records(records: &[Record]) -> Result<Self, AnalysisError> {
        let first = records.first().ok_or(AnalysisError::NoData)?;

        let record_count = records.len();
        let mut total_packets: u64 = 0;
        let mut total_bytes: u64 = 0;
        let mut max_packets = first.packets;
        let mut min_packets = first.packets;
        let mut first_timestamp = first.timestamp;
        let mut last_timestamp = first.timestamp;

        for record in records {
            total_packets = total_packets.saturating_add(record.packets);
            total_bytes = total_bytes.saturating_add(record.bytes.unwrap_or(0));
            max_packets = max_packets.max(record.packets);
            min_packets = min_packets.min(record.packets);
            first_timestamp = first_timestamp.min(record.timestamp);
            last_timestamp = last_timestamp.max(record.timestamp);
        }

        let mean_packets = records.iter().map(|r| r.packets as f64).sum::<f64>() / record_count as f64;
        let std_dev_packets = sample_std_dev(records, mean_packets);

        Ok(Self {
            record_count,
            total_packets,
            total_bytes,
            mean_packets,
            max_packets,
            min_packets,
            std_dev_packets,
            first_timestamp,
            last_timestamp,
        })
    }

    /// Named values in report order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        let mut entries = vec![
            ("total_packets", self.total_packets as f64),
            ("total_bytes", self.total_bytes as f64),
            ("avg_packets_per_bin", self.mean_packets),
            ("max_packets_per_bin", self.max_packets as f64),
            ("min_packets_per_bin", self.min_packets as f64),
        ];
        if let Some(std_dev) = self.std_dev_packets {
            entries.push(("std_dev_packets", std_dev));
        }
        entries.push(("total_bins", self.record_count as f64));
        entries
    }
}

fn sample_std_dev(records: &[Record], mean: f64) -> Option<f64> {
    if records.len() < 2 {
        return None;
    }
    let squared: f64 = records
        .iter()
        .map(|r| {
            let delta = r.packets as f64 - mean;
            delta * delta
        })
        .sum();
    Some((squared / (records.len() - 1) as f64).sqrt())
}
