use ratatui::prelude::*;

pub struct OverviewLayout;
pub struct AnomalyLayout;

impl OverviewLayout {
    pub fn create_layout(area: Rect) -> Vec<Rect> {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),      // Header
                Constraint::Percentage(55), // Traffic chart
                Constraint::Min(8),         // Distributions and stats
                Constraint::Length(3),      // Footer
            ])
            .split(area);

        let bottom_sections = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(35), // Fixed classes
                Constraint::Percentage(30), // Quantiles
                Constraint::Percentage(35), // Stats panel
            ])
            .split(main_chunks[2]);

        vec![
            main_chunks[0],     // Header
            main_chunks[1],     // Traffic chart
            bottom_sections[0], // Fixed classes
            bottom_sections[1], // Quantiles
            bottom_sections[2], // Stats panel
            main_chunks[3],     // Footer
        ]
    }
}

impl AnomalyLayout {
    pub fn create_layout(area: Rect) -> Vec<Rect> {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(5),    // Anomaly table
                Constraint::Length(3), // Footer
            ])
            .split(area);

        vec![main_chunks[0], main_chunks[1], main_chunks[2]]
    }
}

pub struct ResponsiveLayout;

impl ResponsiveLayout {
    pub fn adapt_for_size(area: Rect, layout_type: LayoutType) -> Vec<Rect> {
        match layout_type {
            LayoutType::Overview => {
                if area.width < 80 || area.height < 24 {
                    // Drop the distribution and stats panels on small terminals
                    Self::create_compact_overview(area)
                } else {
                    OverviewLayout::create_layout(area)
                }
            }
            LayoutType::Anomalies => AnomalyLayout::create_layout(area),
        }
    }

    fn create_compact_overview(area: Rect) -> Vec<Rect> {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(6),    // Traffic chart
                Constraint::Length(3), // Footer
            ])
            .split(area);

        vec![chunks[0], chunks[1], chunks[2]]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutType {
    Overview,
    Anomalies,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_layout() {
        let area = Rect::new(0, 0, 120, 40);
        let layout = OverviewLayout::create_layout(area);
        assert_eq!(layout.len(), 6);
        assert_eq!(layout[0].height, 3);
    }

    #[test]
    fn test_responsive_layout() {
        let small_area = Rect::new(0, 0, 50, 15);
        let layout = ResponsiveLayout::adapt_for_size(small_area, LayoutType::Overview);
        assert_eq!(layout.len(), 3);
        assert_eq!(layout[0].height, 3);
        assert!(layout[1].y >= layout[0].y + layout[0].height);
        assert!(layout[2].y >= layout[1].y + layout[1].height);

        let large_area = Rect::new(0, 0, 120, 40);
        let layout = ResponsiveLayout::adapt_for_size(large_area, LayoutType::Overview);
        assert_eq!(layout.len(), 6);
    }
}
