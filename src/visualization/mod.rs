pub mod charts;
pub mod widgets;
pub mod layouts;

pub use charts::{DistributionChart, TrafficChart};
pub use widgets::{AnomalyRow, AnomalyTable, StatsPanel};
pub use layouts::{AnomalyLayout, LayoutType, OverviewLayout, ResponsiveLayout};
