pub mod classifier;
pub mod record;

pub use classifier::{Analysis, ClassifierSettings, TrafficClassifier};
pub use record::{ClassifiedRecord, Record};
