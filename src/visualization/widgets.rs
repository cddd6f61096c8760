use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    style::{Color, Modifier, Style},
};

use crate::traffic::Analysis;
use crate::utils::formatting::{format_count, format_number};

pub struct StatsPanel {
    lines: Vec<(String, String)>,
}

impl StatsPanel {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let mut lines: Vec<(String, String)> = analysis
            .summary
            .entries()
            .into_iter()
            .map(|(name, value)| (name.replace('_', " "), format_number(value)))
            .collect();
        lines.push(("anomalies".to_string(), format_count(analysis.anomaly_count() as u64)));
        lines.push(("threshold".to_string(), format_number(analysis.anomalies.threshold)));
        Self { lines }
    }

    pub fn lines(&self) -> &[(String, String)] {
        &self.lines
    }

    pub fn render(&self, area: Rect, frame: &mut Frame) {
        let text: Vec<Line> = self
            .lines
            .iter()
            .map(|(name, value)| {
                Line::from(vec![
                    Span::styled(format!("{}: ", name), Style::default().fg(Color::Gray)),
                    Span::styled(value.clone(), Style::default().fg(Color::White)),
                ])
            })
            .collect();

        let panel = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Statistics"));
        frame.render_widget(panel, area);
    }
}

/// Anomalous bins, largest first.
pub struct AnomalyTable {
    rows: Vec<AnomalyRow>,
    scroll_offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyRow {
    pub timestamp: String,
    pub packets: u64,
    pub bytes: Option<u64>,
    pub fixed_class: String,
    pub quantile_class: String,
}

impl AnomalyTable {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let rows = analysis
            .anomalies
            .top(usize::MAX)
            .into_iter()
            .filter_map(|anomaly| {
                let classified = analysis.records.iter().find(|c| &c.record == anomaly)?;
                Some(AnomalyRow {
                    timestamp: anomaly.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    packets: anomaly.packets,
                    bytes: anomaly.bytes,
                    fixed_class: classified.fixed_class.clone(),
                    quantile_class: classified.quantile_class.to_string(),
                })
            })
            .collect();

        Self {
            rows,
            scroll_offset: 0,
        }
    }

    pub fn rows(&self) -> &[AnomalyRow] {
        &self.rows
    }

    pub fn scroll_down(&mut self) {
        if self.scroll_offset + 1 < self.rows.len() {
            self.scroll_offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn render(&self, area: Rect, frame: &mut Frame) {
        let header_cells = ["Time", "Packets", "Bytes", "Class", "Quantile"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let visible = area.height.saturating_sub(4) as usize;
        let rows: Vec<Row> = self
            .rows
            .iter()
            .skip(self.scroll_offset)
            .take(visible)
            .map(|row| {
                Row::new(vec![
                    Cell::from(row.timestamp.clone()),
                    Cell::from(format_count(row.packets)),
                    Cell::from(row.bytes.map(format_count).unwrap_or_else(|| "-".to_string())),
                    Cell::from(row.fixed_class.clone()),
                    Cell::from(row.quantile_class.clone()),
                ])
                .style(Style::default().fg(Color::Red))
            })
            .collect();

        let title = format!("Anomalies ({})", self.rows.len());
        let table = Table::new(rows)
            .widths(&[
                Constraint::Percentage(30),
                Constraint::Percentage(17),
                Constraint::Percentage(21),
                Constraint::Percentage(20),
                Constraint::Percentage(12),
            ])
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title));

        frame.render_widget(table, area);
    }
}
