// Library exports for flow-classifier
pub mod analysis;
pub mod capture;
pub mod config;
pub mod report;
pub mod traffic;
pub mod ui;
pub mod utils;
pub mod visualization;

pub use analysis::{anomalies, clustering, quantiles, ranges, statistics};
pub use capture::{record_parser, silk_source};
pub use config::settings;
pub use traffic::{classifier, record};
pub use ui::app;
pub use utils::formatting;
pub use visualization::{charts, widgets, layouts};

// Error types
pub use anyhow::{Error, Result};
