use serde::Serialize;

use crate::analysis::{
    AnalysisError, AnomalyDetector, AnomalySet, KMeans, QuantileBucket, QuantileCut, RangeTable,
    Summary,
};
use crate::traffic::record::{sort_by_timestamp, ClassifiedRecord, Record};

/// Immutable configuration of one classification pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub ranges: RangeTable,
    pub detector: AnomalyDetector,
    pub clustering: Option<KMeans>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            ranges: RangeTable::four_class(),
            detector: AnomalyDetector::default(),
            clustering: None,
        }
    }
}

/// Result of classifying one batch of records.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub records: Vec<ClassifiedRecord>,
    pub anomalies: AnomalySet,
    pub summary: Summary,
    pub quantile_cut: QuantileCut,
    /// Count per fixed-range label, in range table order.
    pub fixed_distribution: Vec<(String, usize)>,
    pub quantile_distribution: Vec<(QuantileBucket, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_centroids: Option<Vec<f64>>,
}

impl Analysis {
    pub fn anomaly_count(&self) -> usize {
        self.anomalies.len()
    }
}

pub struct TrafficClassifier {
    settings: ClassifierSettings,
}

impl TrafficClassifier {
    pub fn new(settings: ClassifierSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    pub fn analyze(&self, mut records: Vec<Record>) -> Result<Analysis, AnalysisError> {
        if records.is_empty() {
            return Err(AnalysisError::NoData);
        }
        sort_by_timestamp(&mut records);

        log::info!("Classifying {} records", records.len());
        let summary = Summary::from_records(&records)?;

        let values: Vec<f64> = records.iter().map(|r| r.packets as f64).collect();
        let quantile_cut = QuantileCut::fit(&values).ok_or(AnalysisError::NoData)?;

        let clusters = match &self.settings.clustering {
            Some(model) => Some(model.fit(&values)?),
            None => None,
        };

        let ranges = &self.settings.ranges;
        let mut fixed_counts = vec![0usize; ranges.len()];
        let mut quantile_counts = [0usize; 4];

        let classified: Vec<ClassifiedRecord> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                // Packet counts are never negative, so every value has a range.
                let index = ranges.index_of(values[i]).unwrap_or(0);
                fixed_counts[index] += 1;

                let quantile_class = quantile_cut.classify(values[i]);
                quantile_counts[quantile_class.index()] += 1;

                ClassifiedRecord {
                    record: record.clone(),
                    fixed_class: ranges.ranges()[index].label.clone(),
                    quantile_class,
                    cluster: clusters.as_ref().map(|c| c.labels[i]),
                }
            })
            .collect();

        let fixed_distribution = ranges
            .labels()
            .into_iter()
            .map(str::to_string)
            .zip(fixed_counts)
            .collect();
        let quantile_distribution = QuantileBucket::ALL
            .iter()
            .copied()
            .zip(quantile_counts)
            .collect();

        let anomalies = self.settings.detector.detect(&records);
        log::info!(
            "Found {} anomalies above {} packets per bin",
            anomalies.len(),
            self.settings.detector.threshold()
        );

        Ok(Analysis {
            records: classified,
            anomalies,
            summary,
            quantile_cut,
            fixed_distribution,
            quantile_distribution,
            cluster_centroids: clusters.map(|c| c.centroids),
        })
    }
}

impl Default for TrafficClassifier {
    fn default() -> Self {
        Self::new(ClassifierSettings::default())
    }
}
