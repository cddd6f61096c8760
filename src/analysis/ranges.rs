use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("Range table is empty")]
    Empty,

    #[error("First range '{label}' must start at 0, found {lower}")]
    FirstLowerNotZero { label: String, lower: f64 },

    #[error("Range {index} ('{label}') has a NaN boundary")]
    NotANumber { index: usize, label: String },

    #[error("Range {index} ('{label}') is empty or inverted: [{lower}, {upper})")]
    EmptyRange { index: usize, label: String, lower: f64, upper: f64 },

    #[error("Gap between range {index} (upper {upper}) and range {next} (lower {next_lower})")]
    Gap { index: usize, next: usize, upper: f64, next_lower: f64 },

    #[error("Overlap between range {index} (upper {upper}) and range {next} (lower {next_lower})")]
    Overlap { index: usize, next: usize, upper: f64, next_lower: f64 },

    #[error("Range {index} ('{label}') is unbounded but is not the last range")]
    UnboundedBeforeEnd { index: usize, label: String },

    #[error("Last range '{label}' must be unbounded, found upper bound {upper}")]
    BoundedFinal { label: String, upper: f64 },

    #[error("Label '{0}' is used by more than one range")]
    DuplicateLabel(String),
}

/// Half-open interval `[lower, upper)` carrying a class label.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub lower: f64,
    pub upper: f64,
    pub label: String,
}

impl Range {
    pub fn new(lower: f64, upper: f64, label: impl Into<String>) -> Self {
        Self {
            lower,
            upper,
            label: label.into(),
        }
    }

    pub fn unbounded(lower: f64, label: impl Into<String>) -> Self {
        Self::new(lower, f64::INFINITY, label)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value < self.upper
    }
}

/// Range as written in configuration files; a missing `upper` means unbounded.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RangeSpec {
    pub lower: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    pub label: String,
}

impl From<&RangeSpec> for Range {
    fn from(spec: &RangeSpec) -> Self {
        Range::new(spec.lower, spec.upper.unwrap_or(f64::INFINITY), spec.label.clone())
    }
}

impl From<&Range> for RangeSpec {
    fn from(range: &Range) -> Self {
        RangeSpec {
            lower: range.lower,
            upper: range.upper.is_finite().then_some(range.upper),
            label: range.label.clone(),
        }
    }
}

/// Validated partition of `[0, +inf)` into labelled ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTable {
    ranges: Vec<Range>,
}

impl RangeTable {
    pub fn new(ranges: Vec<Range>) -> Result<Self, RangeError> {
        Self::validate(&ranges)?;
        Ok(Self { ranges })
    }

    pub fn from_specs(specs: &[RangeSpec]) -> Result<Self, RangeError> {
        Self::new(specs.iter().map(Range::from).collect())
    }

    /// Low / Medium / High / Very High packets per bin.
    pub fn four_class() -> Self {
        Self {
            ranges: vec![
                Range::new(0.0, 601.0, "Low"),
                Range::new(601.0, 6001.0, "Medium"),
                Range::new(6001.0, 60001.0, "High"),
                Range::unbounded(60001.0, "Very High"),
            ],
        }
    }

    pub fn five_class() -> Self {
        Self {
            ranges: vec![
                Range::new(0.0, 10.0, "Very Low"),
                Range::new(10.0, 100.0, "Low"),
                Range::new(100.0, 500.0, "Medium"),
                Range::new(500.0, 1000.0, "High"),
                Range::unbounded(1000.0, "Very High"),
            ],
        }
    }

    fn validate(ranges: &[Range]) -> Result<(), RangeError> {
        let first = ranges.first().ok_or(RangeError::Empty)?;
        let last_index = ranges.len() - 1;

        for (index, range) in ranges.iter().enumerate() {
            if range.lower.is_nan() || range.upper.is_nan() {
                return Err(RangeError::NotANumber {
                    index,
                    label: range.label.clone(),
                });
            }
            if range.upper.is_infinite() && range.upper > 0.0 && index != last_index {
                return Err(RangeError::UnboundedBeforeEnd {
                    index,
                    label: range.label.clone(),
                });
            }
            if range.upper <= range.lower || range.lower.is_infinite() {
                return Err(RangeError::EmptyRange {
                    index,
                    label: range.label.clone(),
                    lower: range.lower,
                    upper: range.upper,
                });
            }
        }

        if first.lower != 0.0 {
            return Err(RangeError::FirstLowerNotZero {
                label: first.label.clone(),
                lower: first.lower,
            });
        }

        for (index, pair) in ranges.windows(2).enumerate() {
            let (current, next) = (&pair[0], &pair[1]);
            if current.upper < next.lower {
                return Err(RangeError::Gap {
                    index,
                    next: index + 1,
                    upper: current.upper,
                    next_lower: next.lower,
                });
            }
            if current.upper > next.lower {
                return Err(RangeError::Overlap {
                    index,
                    next: index + 1,
                    upper: current.upper,
                    next_lower: next.lower,
                });
            }
        }

        let last = &ranges[last_index];
        if last.upper.is_finite() {
            return Err(RangeError::BoundedFinal {
                label: last.label.clone(),
                upper: last.upper,
            });
        }

        let mut seen = HashSet::new();
        for range in ranges {
            if !seen.insert(range.label.as_str()) {
                return Err(RangeError::DuplicateLabel(range.label.clone()));
            }
        }

        Ok(())
    }

    /// Index of the range containing `value`, `None` for negative or NaN input.
    pub fn index_of(&self, value: f64) -> Option<usize> {
        if value.is_nan() || value < 0.0 {
            return None;
        }
        // Lower bounds are strictly increasing and the first one is 0.
        let position = self.ranges.partition_point(|range| range.lower <= value);
        Some(position - 1)
    }

    pub fn classify(&self, value: f64) -> Option<&Range> {
        self.index_of(value).map(|index| &self.ranges[index])
    }

    pub fn label_of(&self, value: f64) -> Option<&str> {
        self.classify(value).map(|range| range.label.as_str())
    }

    pub fn range_for_label(&self, label: &str) -> Option<&Range> {
        self.ranges.iter().find(|range| range.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.ranges.iter().map(|range| range.label.as_str()).collect()
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn to_specs(&self) -> Vec<RangeSpec> {
        self.ranges.iter().map(RangeSpec::from).collect()
    }
}

impl Default for RangeTable {
    fn default() -> Self {
        Self::four_class()
    }
}
