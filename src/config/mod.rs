pub mod settings;

pub use settings::{ClassifierConfig, Config, ConfigError, OutputConfig, RangePreset, SourceConfig};
