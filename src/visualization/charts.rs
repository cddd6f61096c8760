use chrono::NaiveDateTime;
use ratatui::{
    prelude::*,
    widgets::{Axis, BarChart, Block, Borders, Chart, Dataset, GraphType},
    symbols,
    style::{Color, Style},
};

use crate::traffic::Analysis;
use crate::utils::formatting::{format_count, truncate_string};

/// Packets per bin over time, with anomalies overlaid.
pub struct TrafficChart {
    points: Vec<(f64, f64)>,    // (minutes since start, packets)
    anomalies: Vec<(f64, f64)>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    threshold: f64,
    max_packets: f64,
}

impl TrafficChart {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let start = analysis.summary.first_timestamp;
        let offset = |timestamp: NaiveDateTime| (timestamp - start).num_seconds() as f64 / 60.0;

        let points = analysis
            .records
            .iter()
            .map(|r| (offset(r.timestamp()), r.packets() as f64))
            .collect();
        let anomalies = analysis
            .anomalies
            .iter()
            .map(|r| (offset(r.timestamp), r.packets as f64))
            .collect();

        Self {
            points,
            anomalies,
            start,
            end: analysis.summary.last_timestamp,
            threshold: analysis.anomalies.threshold,
            max_packets: analysis.summary.max_packets as f64,
        }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn anomaly_points(&self) -> &[(f64, f64)] {
        &self.anomalies
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let span = (self.end - self.start).num_seconds() as f64 / 60.0;
        [0.0, span.max(1.0)]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        [0.0, self.max_packets.max(self.threshold).max(1.0) * 1.05]
    }

    pub fn render(&self, area: Rect, frame: &mut Frame) {
        let [x_min, x_max] = self.x_bounds();
        let [_, y_max] = self.y_bounds();
        let threshold_line = vec![(x_min, self.threshold), (x_max, self.threshold)];

        let datasets = vec![
            Dataset::default()
                .name("Packets")
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(Color::Cyan))
                .graph_type(GraphType::Line)
                .data(&self.points),
            Dataset::default()
                .name("Threshold")
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(Color::DarkGray))
                .graph_type(GraphType::Line)
                .data(&threshold_line),
            Dataset::default()
                .name("Anomalies")
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(Color::Red))
                .graph_type(GraphType::Scatter)
                .data(&self.anomalies),
        ];

        let middle = self.start + (self.end - self.start) / 2;
        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .title("TCP Traffic")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::White)),
            )
            .x_axis(
                Axis::default()
                    .title("Time")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([x_min, x_max])
                    .labels(vec![
                        self.start.format("%m-%d %H:%M").to_string().into(),
                        middle.format("%m-%d %H:%M").to_string().into(),
                        self.end.format("%m-%d %H:%M").to_string().into(),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("Packets/bin")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, y_max])
                    .labels(vec![
                        "0".into(),
                        format_count((y_max / 2.0) as u64).into(),
                        format_count(y_max as u64).into(),
                    ]),
            );

        frame.render_widget(chart, area);
    }
}

/// Record count per class label.
pub struct DistributionChart {
    title: String,
    bars: Vec<(String, u64)>,
    color: Color,
}

impl DistributionChart {
    pub fn new(title: impl Into<String>, color: Color) -> Self {
        Self {
            title: title.into(),
            bars: Vec::new(),
            color,
        }
    }

    pub fn fixed_classes(analysis: &Analysis) -> Self {
        let mut chart = Self::new("Traffic Distribution by Class", Color::Yellow);
        chart.update_data(
            analysis
                .fixed_distribution
                .iter()
                .map(|(label, count)| (label.clone(), *count as u64))
                .collect(),
        );
        chart
    }

    pub fn quantiles(analysis: &Analysis) -> Self {
        let mut chart = Self::new("Quantile Distribution", Color::Green);
        chart.update_data(
            analysis
                .quantile_distribution
                .iter()
                .map(|(bucket, count)| (bucket.to_string(), *count as u64))
                .collect(),
        );
        chart
    }

    pub fn update_data(&mut self, bars: Vec<(String, u64)>) {
        self.bars = bars;
    }

    pub fn bars(&self) -> &[(String, u64)] {
        &self.bars
    }

    pub fn render(&self, area: Rect, frame: &mut Frame) {
        let block = Block::default().title(self.title.as_str()).borders(Borders::ALL);

        if self.bars.is_empty() {
            frame.render_widget(block, area);
            return;
        }

        let inner_width = area.width.saturating_sub(2) as usize;
        let bar_width = (inner_width / self.bars.len()).saturating_sub(1).clamp(3, 12);

        let labels: Vec<String> = self
            .bars
            .iter()
            .map(|(label, _)| truncate_string(label, bar_width))
            .collect();
        let data: Vec<(&str, u64)> = labels
            .iter()
            .zip(&self.bars)
            .map(|(label, (_, count))| (label.as_str(), *count))
            .collect();

        let chart = BarChart::default()
            .block(block)
            .data(&data)
            .bar_width(bar_width as u16)
            .bar_gap(1)
            .bar_style(Style::default().fg(self.color))
            .value_style(Style::default().fg(Color::Black).bg(self.color));

        frame.render_widget(chart, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::{Record, TrafficClassifier};
    use chrono::{Duration, NaiveDate};

    fn analysis(packets: &[u64]) -> Analysis {
        let start = NaiveDate::from_ymd_opt(2004, 10, 4)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        let records = packets
            .iter()
            .enumerate()
            .map(|(i, p)| Record::new(start + Duration::minutes(i as i64), *p, None))
            .collect();
        TrafficClassifier::default().analyze(records).unwrap()
    }

    #[test]
    fn test_traffic_chart_points() {
        let chart = TrafficChart::from_analysis(&analysis(&[10, 5000, 20]));

        assert_eq!(chart.points(), &[(0.0, 10.0), (1.0, 5000.0), (2.0, 20.0)]);
        assert_eq!(chart.anomaly_points(), &[(1.0, 5000.0)]);
        assert_eq!(chart.x_bounds(), [0.0, 2.0]);
        assert_eq!(chart.y_bounds(), [0.0, 5250.0]);
    }

    #[test]
    fn test_single_point_has_nonzero_span() {
        let chart = TrafficChart::from_analysis(&analysis(&[10]));
        assert_eq!(chart.x_bounds(), [0.0, 1.0]);
        assert_eq!(chart.y_bounds()[1], 1050.0);
    }

    #[test]
    fn test_distribution_bars() {
        let result = analysis(&[10, 20, 700]);
        let fixed = DistributionChart::fixed_classes(&result);
        assert_eq!(fixed.bars()[0], ("Low".to_string(), 2));
        assert_eq!(fixed.bars()[1], ("Medium".to_string(), 1));

        let quantiles = DistributionChart::quantiles(&result);
        let labels: Vec<&str> = quantiles.bars().iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Q1", "Q2", "Q3", "Q4"]);
    }
}
