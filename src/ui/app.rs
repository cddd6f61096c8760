use ratatui::{
    backend::CrosstermBackend,
    widgets::{Block, Borders, Paragraph},
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    Terminal, Frame,
};
use crossterm::{
    terminal::{enable_raw_mode, disable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    event::{self, Event, KeyCode, KeyEventKind},
    ExecutableCommand,
};
use std::io;
use std::time::Duration;

use crate::traffic::Analysis;
use crate::utils::formatting::format_duration;
use crate::visualization::{
    AnomalyTable, DistributionChart, LayoutType, ResponsiveLayout, StatsPanel, TrafficChart,
};

const TABS: [&str; 2] = ["Overview", "Anomalies"];

/// Read-only terminal view of one finished analysis.
pub struct App {
    pub should_quit: bool,
    pub selected_tab: usize,
    bin_size: u64,
    traffic_chart: TrafficChart,
    class_chart: DistributionChart,
    quantile_chart: DistributionChart,
    stats_panel: StatsPanel,
    anomaly_table: AnomalyTable,
}

impl App {
    pub fn new(analysis: &Analysis, bin_size: u64) -> App {
        App {
            should_quit: false,
            selected_tab: 0,
            bin_size,
            traffic_chart: TrafficChart::from_analysis(analysis),
            class_chart: DistributionChart::fixed_classes(analysis),
            quantile_chart: DistributionChart::quantiles(analysis),
            stats_panel: StatsPanel::from_analysis(analysis),
            anomaly_table: AnomalyTable::from_analysis(analysis),
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let result = self.run_in_raw_mode();

        // Restore the terminal even when setup or drawing failed.
        let _ = io::stdout().execute(LeaveAlternateScreen);
        disable_raw_mode()?;
        result
    }

    fn run_in_raw_mode(&mut self) -> anyhow::Result<()> {
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        self.event_loop(&mut terminal)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        while !self.should_quit {
            terminal.draw(|f| self.draw(f))?;

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => {
                self.selected_tab = (self.selected_tab + 1) % TABS.len();
            },
            KeyCode::Char('1') => self.selected_tab = 0,
            KeyCode::Char('2') => self.selected_tab = 1,
            KeyCode::Down | KeyCode::Char('j') => self.anomaly_table.scroll_down(),
            KeyCode::Up | KeyCode::Char('k') => self.anomaly_table.scroll_up(),
            _ => {}
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        match self.selected_tab {
            1 => {
                let chunks = ResponsiveLayout::adapt_for_size(f.size(), LayoutType::Anomalies);
                self.draw_header(f, chunks[0]);
                self.anomaly_table.render(chunks[1], f);
                self.draw_footer(f, chunks[2]);
            }
            _ => {
                let chunks = ResponsiveLayout::adapt_for_size(f.size(), LayoutType::Overview);
                self.draw_header(f, chunks[0]);
                self.traffic_chart.render(chunks[1], f);
                if chunks.len() == 6 {
                    self.class_chart.render(chunks[2], f);
                    self.quantile_chart.render(chunks[3], f);
                    self.stats_panel.render(chunks[4], f);
                }
                self.draw_footer(f, chunks[chunks.len() - 1]);
            }
        }
    }

    fn draw_header(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let selected_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let normal_style = Style::default().fg(Color::White);

        let tab_titles: Vec<Span> = TABS.iter().enumerate().map(|(i, &tab)| {
            let style = if i == self.selected_tab { selected_style } else { normal_style };
            Span::styled(format!(" {} ", tab), style)
        }).collect();

        let header = Paragraph::new(Line::from(tab_titles))
            .block(Block::default().borders(Borders::ALL).title("Flow Classifier"))
            .alignment(Alignment::Center);

        f.render_widget(header, area);
    }

    fn draw_footer(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let help_text = format!(
            "Press 'q' to quit | Tab/1-2 to switch tabs | Up/Down to scroll | Bin size: {}",
            format_duration(self.bin_size)
        );
        let footer = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);

        f.render_widget(footer, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::{Record, TrafficClassifier};
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use ratatui::backend::TestBackend;

    fn app() -> App {
        let start = NaiveDate::from_ymd_opt(2004, 10, 4)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        let records = [100, 2500, 700, 90000]
            .iter()
            .enumerate()
            .map(|(i, p)| Record::new(start + ChronoDuration::minutes(i as i64), *p, None))
            .collect();
        let analysis = TrafficClassifier::default().analyze(records).unwrap();
        App::new(&analysis, 60)
    }

    #[test]
    fn test_tab_switching() {
        let mut app = app();
        assert_eq!(app.selected_tab, 0);

        app.handle_key(KeyCode::Tab);
        assert_eq!(app.selected_tab, 1);
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.selected_tab, 0);
        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.selected_tab, 1);

        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_event_loop_stops_once_quit() {
        let mut app = app();
        app.handle_key(KeyCode::Esc);

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        assert!(app.event_loop(&mut terminal).is_ok());
    }

    #[test]
    fn test_draws_both_tabs() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();

        terminal.draw(|f| app.draw(f)).unwrap();
        app.handle_key(KeyCode::Tab);
        terminal.draw(|f| app.draw(f)).unwrap();

        let mut small = Terminal::new(TestBackend::new(40, 12)).unwrap();
        small.draw(|f| app.draw(f)).unwrap();
    }
}
