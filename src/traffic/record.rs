use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::analysis::quantiles::QuantileBucket;

/// One time bin of flow counts as reported by the upstream tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub packets: u64,
    pub bytes: Option<u64>,
}

impl Record {
    pub fn new(timestamp: NaiveDateTime, packets: u64, bytes: Option<u64>) -> Self {
        Self {
            timestamp,
            packets,
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: Record,
    pub fixed_class: String,
    pub quantile_class: QuantileBucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
}

impl ClassifiedRecord {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.record.timestamp
    }

    pub fn packets(&self) -> u64 {
        self.record.packets
    }
}

/// Sort records by timestamp, keeping input order for equal timestamps.
pub fn sort_by_timestamp(records: &mut [Record]) {
    records.sort_by_key(|record| record.timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2004, 10, 4)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_sort_is_stable() {
        let mut records = vec![
            Record::new(at(20, 2), 3, None),
            Record::new(at(20, 0), 1, None),
            Record::new(at(20, 2), 4, Some(10)),
        ];
        sort_by_timestamp(&mut records);

        let packets: Vec<u64> = records.iter().map(|r| r.packets).collect();
        assert_eq!(packets, vec![1, 3, 4]);
    }

    #[test]
    fn test_classified_record_json_is_flat() {
        let classified = ClassifiedRecord {
            record: Record::new(at(20, 0), 42, None),
            fixed_class: "Low".to_string(),
            quantile_class: QuantileBucket::Q2,
            cluster: None,
        };
        let value = serde_json::to_value(&classified).unwrap();

        assert_eq!(value["packets"], 42);
        assert_eq!(value["fixed_class"], "Low");
        assert_eq!(value["quantile_class"], "Q2");
        assert!(value.get("cluster").is_none());
    }
}
