pub mod record_parser;
pub mod silk_source;

pub use record_parser::{ParseError, ParsedBatch, RecordParser, SkippedLine};
pub use silk_source::{check_environment, DataSource, FileSource, SilkSource, SourceError};
