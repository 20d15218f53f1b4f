use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen areas of the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardLayout {
    pub gpu: Rect,
    pub system: Rect,
    pub servers: Rect,
    pub models: Rect,
    pub tokens: Rect,
    pub terminal: Rect,
    pub help: Rect,
}

/// Data panels on top, terminal pane below, help bar at the bottom
pub fn dashboard_layout(area: Rect) -> DashboardLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(35),
            Constraint::Percentage(25),
        ])
        .split(vertical[0]);

    let middle = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(columns[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(columns[2]);

    DashboardLayout {
        gpu: columns[0],
        system: middle[0],
        models: middle[1],
        servers: right[0],
        tokens: right[1],
        terminal: vertical[1],
        help: vertical[2],
    }
}

/// Area inside a 1-cell border
pub fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}
