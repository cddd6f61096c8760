use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::traffic::record::{sort_by_timestamp, Record};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected at least 2 '|'-separated fields, found {0}")]
    MissingFields(usize),

    #[error("unrecognised timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("invalid {field} count '{value}'")]
    InvalidCount { field: &'static str, value: String },
}

/// A line that was dropped while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub line_number: usize,
    pub line: String,
    pub error: ParseError,
}

/// Records parsed from one block of tool output, sorted by timestamp.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub records: Vec<Record>,
    pub skipped: Vec<SkippedLine>,
}

impl ParsedBatch {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y/%m/%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

pub struct RecordParser;

impl RecordParser {
    /// Parse a whole block of `timestamp|packets[|bytes]` lines.
    pub fn parse_output(output: &str) -> ParsedBatch {
        let mut batch = ParsedBatch::default();

        for (index, line) in output.lines().enumerate() {
            match Self::parse_line(line) {
                Ok(Some(record)) => batch.records.push(record),
                Ok(None) => {}
                Err(error) => {
                    log::warn!("Skipping line {} '{}': {}", index + 1, line.trim(), error);
                    batch.skipped.push(SkippedLine {
                        line_number: index + 1,
                        line: line.to_string(),
                        error,
                    });
                }
            }
        }

        sort_by_timestamp(&mut batch.records);
        log::info!(
            "Parsed {} records ({} lines skipped)",
            batch.records.len(),
            batch.skipped.len()
        );
        batch
    }

    /// Parse one line; comments and blank lines yield `Ok(None)`.
    pub fn parse_line(line: &str) -> Result<Option<Record>, ParseError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() < 2 {
            return Err(ParseError::MissingFields(fields.len()));
        }

        let timestamp = Self::parse_timestamp(fields[0])?;
        let packets = Self::parse_count("packet", fields[1])?;

        // SiLK delimited output ends every line with a trailing '|'.
        let bytes = match fields.get(2) {
            Some(value) if !value.is_empty() => Some(Self::parse_count("byte", value)?),
            _ => None,
        };

        Ok(Some(Record::new(timestamp, packets, bytes)))
    }

    pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ParseError> {
        for format in TIMESTAMP_FORMATS {
            if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
                return Ok(timestamp);
            }
        }

        if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
            return Ok(timestamp.naive_utc());
        }

        // SiLK hour precision, e.g. 2004/10/04:20
        if let Some((date, hour)) = value.rsplit_once(':') {
            if let (Ok(date), Ok(hour)) = (Self::parse_date(date), hour.parse::<u32>()) {
                if let Some(timestamp) = date.and_hms_opt(hour, 0, 0) {
                    return Ok(timestamp);
                }
            }
        }

        Self::parse_date(value)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| ParseError::InvalidTimestamp(value.to_string()))
    }

    fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(value, "%Y/%m/%d")
            .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
    }

    /// Counts may be printed as floats; they are truncated toward zero.
    pub fn parse_count(field: &'static str, value: &str) -> Result<u64, ParseError> {
        let invalid = || ParseError::InvalidCount {
            field,
            value: value.to_string(),
        };

        if let Ok(count) = value.parse::<u64>() {
            return Ok(count);
        }

        let float: f64 = value.parse().map_err(|_| invalid())?;
        if !float.is_finite() || float < 0.0 || float >= u64::MAX as f64 {
            return Err(invalid());
        }
        Ok(float.trunc() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_silk_line() {
        let record = RecordParser::parse_line("2004/10/04T20:01:00|  1234|  567890|")
            .unwrap()
            .unwrap();
        assert_eq!(record.timestamp, at(2004, 10, 4, 20, 1, 0));
        assert_eq!(record.packets, 1234);
        assert_eq!(record.bytes, Some(567890));
    }

    #[test]
    fn test_bytes_are_optional() {
        let record = RecordParser::parse_line("2004-10-04 20:01:00|12").unwrap().unwrap();
        assert_eq!(record.bytes, None);

        let record = RecordParser::parse_line("2004-10-04 20:01:00|12|").unwrap().unwrap();
        assert_eq!(record.bytes, None);
    }

    #[test]
    fn test_float_counts_are_truncated() {
        let record = RecordParser::parse_line("2004/10/04T20:01:00|12.9|3e3").unwrap().unwrap();
        assert_eq!(record.packets, 12);
        assert_eq!(record.bytes, Some(3000));
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        assert_eq!(RecordParser::parse_line("# sTime|packets|bytes"), Ok(None));
        assert_eq!(RecordParser::parse_line("   "), Ok(None));
    }

    #[test]
    fn test_invalid_lines() {
        assert_eq!(
            RecordParser::parse_line("2004/10/04T20:01:00"),
            Err(ParseError::MissingFields(1))
        );
        assert_eq!(
            RecordParser::parse_line("2004/10/04T20:01:00|"),
            Err(ParseError::InvalidCount {
                field: "packet",
                value: String::new(),
            })
        );
        assert!(matches!(
            RecordParser::parse_line("yesterday|5"),
            Err(ParseError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            RecordParser::parse_line("2004/10/04T20:01:00|-5"),
            Err(ParseError::InvalidCount { field: "packet", .. })
        ));
        assert!(matches!(
            RecordParser::parse_line("2004/10/04T20:01:00|5|NaN"),
            Err(ParseError::InvalidCount { field: "byte", .. })
        ));
    }

    #[test]
    fn test_timestamp_forms() {
        let expected = at(2004, 10, 4, 20, 0, 0);
        for value in [
            "2004/10/04T20:00:00",
            "2004/10/04T20:00:00.000",
            "2004/10/04 20:00:00",
            "2004-10-04T20:00:00",
            "2004-10-04 20:00:00",
            "2004-10-04T20:00:00Z",
            "2004-10-04T22:00:00+02:00",
            "2004/10/04:20",
        ] {
            assert_eq!(RecordParser::parse_timestamp(value), Ok(expected), "{}", value);
        }
        assert_eq!(
            RecordParser::parse_timestamp("2004/10/04"),
            Ok(at(2004, 10, 4, 0, 0, 0))
        );
    }

    #[test]
    fn test_parse_output_skips_and_sorts() {
        let output = "\
# rwstats output
sTime|packets|bytes|
2004/10/04T20:02:00|300|3000|
2004/10/04T20:00:00|100|1000|
garbage
2004/10/04T20:01:00|200|2000|
";
        let batch = RecordParser::parse_output(output);

        let packets: Vec<u64> = batch.records.iter().map(|r| r.packets).collect();
        assert_eq!(packets, vec![100, 200, 300]);
        assert_eq!(batch.skipped_count(), 2);
        assert_eq!(batch.skipped[0].line_number, 2);
        assert_eq!(batch.skipped[1].line, "garbage");
        assert_eq!(batch.skipped[1].error, ParseError::MissingFields(1));
    }

    #[test]
    fn test_empty_output() {
        let batch = RecordParser::parse_output("");
        assert!(batch.is_empty());
        assert_eq!(batch.skipped_count(), 0);
    }
}
