pub mod writer;

pub use writer::{key_findings, write_json, ReportWriter};
