use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::traffic::Analysis;
use crate::utils::formatting::{format_count, format_duration, format_number};

/// Renders an [`Analysis`] as the plain-text results file.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    pub top_anomalies: usize,
    pub bin_size: u64,
    pub skipped_lines: usize,
}

impl ReportWriter {
    pub fn new(top_anomalies: usize, bin_size: u64) -> Self {
        Self {
            top_anomalies,
            bin_size,
            skipped_lines: 0,
        }
    }

    pub fn with_skipped_lines(mut self, skipped_lines: usize) -> Self {
        self.skipped_lines = skipped_lines;
        self
    }

    pub fn render(&self, analysis: &Analysis) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render_into(&mut out, analysis);
        out
    }

    fn render_into(&self, out: &mut String, analysis: &Analysis) -> std::fmt::Result {
        let summary = &analysis.summary;

        writeln!(out, "=== TCP Traffic Classification Results ===")?;
        writeln!(out)?;
        writeln!(
            out,
            "Period: {} to {} ({} bins)",
            summary.first_timestamp,
            summary.last_timestamp,
            format_duration(self.bin_size)
        )?;
        if self.skipped_lines > 0 {
            writeln!(out, "Skipped input lines: {}", format_count(self.skipped_lines as u64))?;
        }
        writeln!(out)?;

        writeln!(out, "Overall Statistics:")?;
        for (name, value) in summary.entries() {
            writeln!(out, "{}: {}", name, format_number(value))?;
        }

        let label_width = analysis
            .fixed_distribution
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0);

        writeln!(out)?;
        writeln!(out, "Traffic Classification Summary:")?;
        for (label, count) in &analysis.fixed_distribution {
            writeln!(out, "{:<width$}  {}", label, count, width = label_width)?;
        }

        writeln!(out)?;
        writeln!(out, "Quantile Classification Summary:")?;
        for (bucket, count) in &analysis.quantile_distribution {
            writeln!(
                out,
                "{}  {}  (<= {})",
                bucket,
                count,
                format_number(analysis.quantile_cut.upper_edge(*bucket))
            )?;
        }

        if let Some(centroids) = &analysis.cluster_centroids {
            writeln!(out)?;
            writeln!(out, "Cluster Centroids:")?;
            for (id, centroid) in centroids.iter().enumerate() {
                writeln!(out, "{}  {}", id, format_number(*centroid))?;
            }
        }

        writeln!(out)?;
        writeln!(
            out,
            "Anomalies Detected: {} (threshold {} packets per bin)",
            analysis.anomaly_count(),
            format_number(analysis.anomalies.threshold)
        )?;

        let top = analysis.anomalies.top(self.top_anomalies);
        if !top.is_empty() {
            writeln!(out)?;
            writeln!(out, "Top {} Anomalous Periods:", top.len())?;
            writeln!(out, "{:<20} {:>15} {:>18}", "timestamp", "packets", "bytes")?;
            for record in top {
                let bytes = record.bytes.map(format_count).unwrap_or_else(|| "-".to_string());
                writeln!(
                    out,
                    "{:<20} {:>15} {:>18}",
                    record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    format_count(record.packets),
                    bytes
                )?;
            }
        }

        Ok(())
    }

    pub fn write(&self, path: impl AsRef<Path>, analysis: &Analysis) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render(analysis))
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("Saved results to {}", path.display());
        Ok(())
    }
}

pub fn write_json(path: impl AsRef<Path>, analysis: &Analysis) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(analysis).context("Failed to encode analysis")?;
    fs::write(path, json).with_context(|| format!("Failed to write JSON to {}", path.display()))?;
    log::info!("Saved JSON export to {}", path.display());
    Ok(())
}

/// One line per summary value, for printing after a run.
pub fn key_findings(analysis: &Analysis) -> Vec<String> {
    let mut findings: Vec<String> = analysis
        .summary
        .entries()
        .into_iter()
        .map(|(name, value)| format!("{}: {}", name, format_number(value)))
        .collect();
    findings.push(format!("anomalies: {}", format_count(analysis.anomaly_count() as u64)));
    findings
}
