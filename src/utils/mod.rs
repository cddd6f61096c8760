pub mod formatting;

pub use formatting::{format_count, format_duration, format_number, truncate_string};
