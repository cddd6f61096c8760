use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisError;

const MAX_ITERATIONS: usize = 300;

/// Deterministic one-dimensional k-means over packet counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    clusters: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Centroids in ascending order; cluster id is the index.
    pub centroids: Vec<f64>,
    pub labels: Vec<usize>,
    pub iterations: usize,
}

impl KMeans {
    pub fn new(clusters: usize) -> Result<Self, AnalysisError> {
        if clusters == 0 {
            return Err(AnalysisError::InvalidClusterCount(clusters));
        }
        Ok(Self { clusters })
    }

    pub fn clusters(&self) -> usize {
        self.clusters
    }

    pub fn fit(&self, values: &[f64]) -> Result<ClusterAssignment, AnalysisError> {
        if values.is_empty() {
            return Err(AnalysisError::NoData);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mut distinct = sorted.clone();
        distinct.dedup();

        let k = self.clusters.min(distinct.len());
        if k < self.clusters {
            log::debug!("Clamping k-means from {} to {} clusters", self.clusters, k);
        }

        // Seed at evenly spaced positions over the distinct values.
        let mut centroids: Vec<f64> = (0..k)
            .map(|i| {
                let position = if k == 1 { 0 } else { i * (distinct.len() - 1) / (k - 1) };
                distinct[position]
            })
            .collect();

        let mut labels = vec![usize::MAX; values.len()];
        let mut iterations = 0;

        while iterations < MAX_ITERATIONS {
            iterations += 1;
            let mut changed = false;
            for (label, value) in labels.iter_mut().zip(values) {
                let nearest = nearest_centroid(&centroids, *value);
                if *label != nearest {
                    *label = nearest;
                    changed = true;
                }
            }
            if !changed {
                break;
            }

            let mut sums = vec![0.0; k];
            let mut counts = vec![0usize; k];
            for (label, value) in labels.iter().zip(values) {
                sums[*label] += value;
                counts[*label] += 1;
            }
            for (i, centroid) in centroids.iter_mut().enumerate() {
                // Empty clusters keep their previous centroid.
                if counts[i] > 0 {
                    *centroid = sums[i] / counts[i] as f64;
                }
            }
        }

        let (centroids, labels) = renumber(centroids, labels);
        Ok(ClusterAssignment {
            centroids,
            labels,
            iterations,
        })
    }
}

impl Default for KMeans {
    fn default() -> Self {
        Self { clusters: 5 }
    }
}

fn nearest_centroid(centroids: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = (value - centroid).abs();
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

/// Reorder clusters so that id 0 has the smallest centroid.
fn renumber(centroids: Vec<f64>, labels: Vec<usize>) -> (Vec<f64>, Vec<usize>) {
    let mut order: Vec<usize> = (0..centroids.len()).collect();
    order.sort_by(|a, b| centroids[*a].total_cmp(&centroids[*b]));

    let mut new_id = vec![0; centroids.len()];
    for (rank, old) in order.iter().enumerate() {
        new_id[*old] = rank;
    }

    let centroids = order.iter().map(|old| centroids[*old]).collect();
    let labels = labels.into_iter().map(|old| new_id[old]).collect();
    (centroids, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_clusters_rejected() {
        assert!(matches!(KMeans::new(0), Err(AnalysisError::InvalidClusterCount(0))));
    }

    #[test]
    fn test_empty_input_is_no_data() {
        assert!(matches!(KMeans::default().fit(&[]), Err(AnalysisError::NoData)));
    }

    #[test]
    fn test_separated_groups() {
        let values = [1.0, 2.0, 3.0, 100.0, 101.0, 102.0, 1000.0, 1001.0];
        let result = KMeans::new(3).unwrap().fit(&values).unwrap();

        assert_eq!(result.labels, vec![0, 0, 0, 1, 1, 1, 2, 2]);
        assert_eq!(result.centroids, vec![2.0, 101.0, 1000.5]);
    }

    #[test]
    fn test_clamps_to_distinct_values() {
        let values = [4.0, 4.0, 9.0, 9.0];
        let result = KMeans::default().fit(&values).unwrap();

        assert_eq!(result.centroids.len(), 2);
        assert_eq!(result.labels, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_labels_follow_centroid_order() {
        let values = [500.0, 1.0, 250.0, 2.0, 499.0];
        let result = KMeans::new(2).unwrap().fit(&values).unwrap();

        assert!(result.centroids.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(result.labels[1], 0);
        assert_eq!(result.labels[0], 1);
    }

    #[test]
    fn test_is_deterministic() {
        let values: Vec<f64> = (0..50).map(|v| ((v * 37) % 23) as f64).collect();
        let model = KMeans::new(4).unwrap();
        assert_eq!(model.fit(&values).unwrap(), model.fit(&values).unwrap());
    }
}
