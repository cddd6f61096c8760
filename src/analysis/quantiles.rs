use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuantileBucket {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl QuantileBucket {
    pub const ALL: [QuantileBucket; 4] = [
        QuantileBucket::Q1,
        QuantileBucket::Q2,
        QuantileBucket::Q3,
        QuantileBucket::Q4,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for QuantileBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantileBucket::Q1 => write!(f, "Q1"),
            QuantileBucket::Q2 => write!(f, "Q2"),
            QuantileBucket::Q3 => write!(f, "Q3"),
            QuantileBucket::Q4 => write!(f, "Q4"),
        }
    }
}

/// Quartile edges of one dataset.
///
/// `Q1` covers `[e0, e1]` and every later bucket `(e[k-1], e[k]]`. When edges
/// coincide a value lands in the lowest bucket whose upper edge it does not
/// exceed, so a constant series falls entirely into `Q1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileCut {
    edges: [f64; 5],
}

impl QuantileCut {
    /// Returns `None` for an empty dataset.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut edges = [0.0; 5];
        for (i, edge) in edges.iter_mut().enumerate() {
            *edge = interpolate(&sorted, i as f64 / 4.0);
        }

        log::debug!("Quantile edges: {:?}", edges);
        Some(Self { edges })
    }

    pub fn classify(&self, value: f64) -> QuantileBucket {
        let position = self.edges[1..4].iter().position(|edge| value <= *edge);
        match position {
            Some(0) => QuantileBucket::Q1,
            Some(1) => QuantileBucket::Q2,
            Some(2) => QuantileBucket::Q3,
            _ => QuantileBucket::Q4,
        }
    }

    pub fn edges(&self) -> &[f64; 5] {
        &self.edges
    }

    /// Inclusive upper edge of a bucket.
    pub fn upper_edge(&self, bucket: QuantileBucket) -> f64 {
        self.edges[bucket.index() + 1]
    }
}

/// Linear interpolation between closest ranks on sorted data.
fn interpolate(sorted: &[f64], probability: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * probability;
    let below = h.floor() as usize;
    let above = h.ceil() as usize;
    sorted[below] + (h - below as f64) * (sorted[above] - sorted[below])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(cut: &QuantileCut, values: &[f64]) -> [usize; 4] {
        let mut counts = [0; 4];
        for value in values {
            counts[cut.classify(*value).index()] += 1;
        }
        counts
    }

    #[test]
    fn test_empty_has_no_cut() {
        assert!(QuantileCut::fit(&[]).is_none());
    }

    #[test]
    fn test_uniform_sequence_splits_evenly() {
        let values: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let cut = QuantileCut::fit(&values).unwrap();

        assert_eq!(cut.edges(), &[1.0, 25.75, 50.5, 75.25, 100.0]);
        assert_eq!(counts(&cut, &values), [25, 25, 25, 25]);
        assert_eq!(cut.classify(1.0), QuantileBucket::Q1);
        assert_eq!(cut.classify(25.0), QuantileBucket::Q1);
        assert_eq!(cut.classify(26.0), QuantileBucket::Q2);
        assert_eq!(cut.classify(100.0), QuantileBucket::Q4);
    }

    #[test]
    fn test_identical_values_share_bucket() {
        let values = vec![7.0; 12];
        let cut = QuantileCut::fit(&values).unwrap();
        assert_eq!(counts(&cut, &values), [12, 0, 0, 0]);
    }

    #[test]
    fn test_few_distinct_values() {
        let values = vec![1.0, 1.0, 1.0, 5.0];
        let cut = QuantileCut::fit(&values).unwrap();

        // Edges collapse onto 1.0 for the first three quartiles.
        assert_eq!(cut.edges(), &[1.0, 1.0, 1.0, 2.0, 5.0]);
        assert_eq!(cut.classify(1.0), QuantileBucket::Q1);
        assert_eq!(cut.classify(5.0), QuantileBucket::Q4);
    }

    #[test]
    fn test_single_value() {
        let cut = QuantileCut::fit(&[3.0]).unwrap();
        assert_eq!(cut.classify(3.0), QuantileBucket::Q1);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let cut = QuantileCut::fit(&[40.0, 10.0, 30.0, 20.0]).unwrap();
        assert_eq!(cut.edges(), &[10.0, 17.5, 25.0, 32.5, 40.0]);
        assert_eq!(cut.upper_edge(QuantileBucket::Q2), 25.0);
    }

    #[test]
    fn test_bucket_display() {
        let labels: Vec<String> = QuantileBucket::ALL.iter().map(|b| b.to_string()).collect();
        assert_eq!(labels, vec!["Q1", "Q2", "Q3", "Q4"]);
    }
}
