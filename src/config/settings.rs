use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::{AnalysisError, AnomalyDetector, KMeans, RangeError, RangeSpec, RangeTable, ThresholdUnit};
use crate::traffic::ClassifierSettings;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("Cannot write config file {path}: {source}")]
    Write { path: String, source: std::io::Error },

    #[error("Invalid config file: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("Cannot encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Invalid range table: {0}")]
    Ranges(#[from] RangeError),

    #[error("Invalid classifier settings: {0}")]
    Classifier(#[from] AnalysisError),

    #[error("bin_size must be positive")]
    ZeroBinSize,

    #[error("anomaly_threshold must be a finite, non-negative number, got {0}")]
    InvalidThreshold(f64),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub classifier: ClassifierConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    pub start_date: String,
    pub end_date: String,
    pub sensor: String,
    pub protocol: u8,
    /// Width of one time bin in seconds.
    pub bin_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
    #[default]
    FourClass,
    FiveClass,
}

impl RangePreset {
    pub fn table(self) -> RangeTable {
        match self {
            RangePreset::FourClass => RangeTable::four_class(),
            RangePreset::FiveClass => RangeTable::five_class(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub anomaly_threshold: f64,
    pub threshold_unit: ThresholdUnit,
    pub preset: RangePreset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clusters: Option<usize>,
    /// Explicit ranges; when present they replace the preset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranges: Option<Vec<RangeSpec>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<PathBuf>,
    pub top_anomalies: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            start_date: "2004/10/04:20".to_string(),
            end_date: "2005/01/08:05".to_string(),
            sensor: "S0".to_string(),
            protocol: 6,
            bin_size: 60,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold: 1000.0,
            threshold_unit: ThresholdUnit::PerMinute,
            preset: RangePreset::FourClass,
            clusters: None,
            ranges: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from("outputfile.txt"),
            json_path: None,
            top_anomalies: 5,
        }
    }
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    pub fn range_table(&self) -> Result<RangeTable, ConfigError> {
        match &self.classifier.ranges {
            Some(specs) => Ok(RangeTable::from_specs(specs)?),
            None => Ok(self.classifier.preset.table()),
        }
    }

    /// Validate the configuration and build the classifier settings from it.
    pub fn classifier_settings(&self) -> Result<ClassifierSettings, ConfigError> {
        if self.source.bin_size == 0 {
            return Err(ConfigError::ZeroBinSize);
        }
        let threshold = self.classifier.anomaly_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        let detector = AnomalyDetector::with_unit(
            self.classifier.anomaly_threshold,
            self.classifier.threshold_unit,
            self.source.bin_size,
        );
        let clustering = self.classifier.clusters.map(KMeans::new).transpose()?;

        Ok(ClassifierSettings {
            ranges: self.range_table()?,
            detector,
            clustering,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Config::default().classifier_settings().unwrap();
        assert_eq!(settings.ranges, RangeTable::four_class());
        assert_eq!(settings.detector.threshold(), 1000.0);
        assert!(settings.clustering.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [classifier]
            anomaly_threshold = 1000
            threshold_unit = "per-second"
            preset = "five-class"
            "#,
        )
        .unwrap();

        assert_eq!(config.source, SourceConfig::default());
        let settings = config.classifier_settings().unwrap();
        assert_eq!(settings.detector.threshold(), 60000.0);
        assert_eq!(settings.ranges, RangeTable::five_class());
    }

    #[test]
    fn test_explicit_ranges_override_preset() {
        let config: Config = toml::from_str(
            r#"
            [[classifier.ranges]]
            lower = 0
            upper = 50
            label = "quiet"

            [[classifier.ranges]]
            lower = 50
            label = "busy"
            "#,
        )
        .unwrap();

        let table = config.range_table().unwrap();
        assert_eq!(table.labels(), vec!["quiet", "busy"]);
        assert_eq!(table.label_of(1e12), Some("busy"));
    }

    #[test]
    fn test_invalid_ranges_fail_fast() {
        let config: Config = toml::from_str(
            r#"
            [[classifier.ranges]]
            lower = 0
            upper = 50
            label = "quiet"

            [[classifier.ranges]]
            lower = 60
            label = "busy"
            "#,
        )
        .unwrap();

        let err = config.classifier_settings().unwrap_err();
        assert!(matches!(err, ConfigError::Ranges(RangeError::Gap { index: 0, .. })));
    }

    #[test]
    fn test_invalid_cluster_count_and_bin_size() {
        let mut config = Config::default();
        config.classifier.clusters = Some(0);
        assert!(matches!(
            config.classifier_settings(),
            Err(ConfigError::Classifier(AnalysisError::InvalidClusterCount(0)))
        ));

        let mut config = Config::default();
        config.source.bin_size = 0;
        assert!(matches!(config.classifier_settings(), Err(ConfigError::ZeroBinSize)));
    }

    #[test]
    fn test_rejects_unusable_thresholds() {
        for threshold in [f64::NAN, f64::INFINITY, -5.0] {
            let mut config = Config::default();
            config.classifier.anomaly_threshold = threshold;
            assert!(matches!(
                config.classifier_settings(),
                Err(ConfigError::InvalidThreshold(_))
            ));
        }

        let config: Config = toml::from_str("[classifier]\nanomaly_threshold = nan\n").unwrap();
        assert!(matches!(
            config.classifier_settings(),
            Err(ConfigError::InvalidThreshold(_))
        ));

        let mut config = Config::default();
        config.classifier.anomaly_threshold = 0.0;
        assert!(config.classifier_settings().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.toml");

        let mut config = Config::default();
        config.classifier.ranges = Some(RangeTable::five_class().to_specs());
        config.classifier.clusters = Some(3);
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::load_from_file("/nonexistent/classifier.toml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
