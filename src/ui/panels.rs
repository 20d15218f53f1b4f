//! One panel per monitored domain.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Widget, Wrap},
};

use crate::api::{
    DomainData, GpuSample, ModelSummary, ServerConfig, SystemSnapshot, TokenUsage,
};
use crate::scheduler::{Domain, RegionState};

/// Server-list decorations that come from the app rather than the region
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerMarks<'a> {
    pub selected: usize,
    pub terminal_target: Option<&'a str>,
}

/// Renders a domain's region: loading text, its data, or its error.
pub struct RegionPanel<'a> {
    domain: Domain,
    state: &'a RegionState,
    marks: ServerMarks<'a>,
    focused: bool,
}

impl<'a> RegionPanel<'a> {
    pub fn new(domain: Domain, state: &'a RegionState) -> Self {
        Self {
            domain,
            state,
            marks: ServerMarks::default(),
            focused: false,
        }
    }

    pub fn marks(mut self, marks: ServerMarks<'a>) -> Self {
        self.marks = marks;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn block(&self) -> Block<'static> {
        let title = match self.state {
            RegionState::Ready { updated_at, .. } => {
                format!(" {} · {} ", self.domain.title(), updated_at.format("%H:%M:%S"))
            }
            RegionState::Failed { .. } => format!(" {} · failed ", self.domain.title()),
            RegionState::Loading => format!(" {} ", self.domain.title()),
        };
        let border = match (self.state, self.focused) {
            (RegionState::Failed { .. }, _) => Style::default().fg(Color::Red),
            (_, true) => Style::default().fg(Color::Cyan),
            _ => Style::default().fg(Color::DarkGray),
        };
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border)
    }
}

impl<'a> Widget for RegionPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block();
        match self.state {
            RegionState::Loading => {
                Paragraph::new(Span::styled("Loading...", Style::default().fg(Color::DarkGray)))
                    .block(block)
                    .render(area, buf);
            }
            RegionState::Failed { message, at } => {
                Paragraph::new(vec![
                    Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
                    Line::from(Span::styled(
                        format!("at {}; retrying on the next refresh", at.format("%H:%M:%S")),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
                .wrap(Wrap { trim: true })
                .block(block)
                .render(area, buf);
            }
            RegionState::Ready { data, .. } => match data {
                DomainData::Gpu(gpus) => gpu_table(gpus).block(block).render(area, buf),
                DomainData::System(systems) => {
                    system_table(systems).block(block).render(area, buf)
                }
                DomainData::Models(models) => model_list(models).block(block).render(area, buf),
                DomainData::Tokens(usage) => token_overview(usage).block(block).render(area, buf),
                DomainData::Config(servers) => {
                    server_list(servers, self.marks).block(block).render(area, buf)
                }
            },
        }
    }
}

fn header(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.iter().copied().map(Cell::from))
        .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Gray))
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.0}%"))
}

/// Green below 50, yellow below 85, red above
fn load_color(value: Option<f64>) -> Color {
    match value {
        Some(v) if v >= 85.0 => Color::Red,
        Some(v) if v >= 50.0 => Color::Yellow,
        Some(_) => Color::Green,
        None => Color::DarkGray,
    }
}

fn memory(used: Option<u64>, total: Option<u64>) -> String {
    match (used, total) {
        (Some(used), Some(total)) => {
            format!("{:.1}/{:.1}G", used as f64 / 1024.0, total as f64 / 1024.0)
        }
        _ => "-".to_string(),
    }
}

pub(crate) fn uptime(secs: Option<u64>) -> String {
    let Some(secs) = secs else {
        return "-".to_string();
    };
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

fn status_color(status: &str) -> Color {
    match status.to_ascii_uppercase().as_str() {
        "AVAILABLE" | "RUNNING" | "ONLINE" => Color::Green,
        "BUSY" | "STARTING" | "STOPPING" => Color::Yellow,
        "ERROR" | "OFFLINE" => Color::Red,
        _ => Color::DarkGray,
    }
}

fn gpu_table(gpus: &[GpuSample]) -> Table<'static> {
    let rows = gpus.iter().map(|g| {
        let status = g.status.clone().unwrap_or_else(|| "-".to_string());
        Row::new(vec![
            Cell::from(g.server_name.clone()),
            Cell::from(g.gpu_index.to_string()),
            Cell::from(g.gpu_name.clone().unwrap_or_default()),
            Cell::from(pct(g.utilization_gpu))
                .style(Style::default().fg(load_color(g.utilization_gpu))),
            Cell::from(memory(g.memory_used, g.memory_total)),
            Cell::from(g.temperature.map_or_else(|| "-".to_string(), |t| format!("{t:.0}°C"))),
            Cell::from(status.clone()).style(Style::default().fg(status_color(&status))),
        ])
    });
    Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(11),
            Constraint::Length(5),
            Constraint::Length(9),
        ],
    )
    .header(header(&["Server", "#", "Name", "Util", "Memory", "Temp", "Status"]))
}

fn system_table(systems: &[SystemSnapshot]) -> Table<'static> {
    let rows = systems.iter().map(|s| {
        let (label, color) = if s.is_online() {
            ("online", Color::Green)
        } else {
            ("offline", Color::Red)
        };
        Row::new(vec![
            Cell::from(s.server_name.clone()),
            Cell::from(label).style(Style::default().fg(color)),
            Cell::from(pct(s.cpu_usage)).style(Style::default().fg(load_color(s.cpu_usage))),
            Cell::from(pct(s.memory_percent))
                .style(Style::default().fg(load_color(s.memory_percent))),
            Cell::from(pct(s.disk_percent)).style(Style::default().fg(load_color(s.disk_percent))),
            Cell::from(uptime(s.uptime)),
        ])
    });
    Table::new(
        rows,
        [
            Constraint::Min(8),
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(7),
        ],
    )
    .header(header(&["Server", "State", "CPU", "Mem", "Disk", "Up"]))
}

fn model_list(models: &[ModelSummary]) -> List<'static> {
    let items: Vec<ListItem> = models
        .iter()
        .map(|m| {
            let marker = if m.is_running() { "● " } else { "○ " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(status_color(&m.status))),
                Span::raw(m.name.clone()),
                Span::styled(
                    format!(" @{} · {} tok", m.server_name, m.total_tokens),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();
    List::new(items)
}

fn token_overview(usage: &TokenUsage) -> Paragraph<'static> {
    let o = &usage.overview;
    let mut lines = vec![
        Line::from(format!("Running models: {}", o.total_running_models)),
        Line::from(format!("Tokens: {}", o.total_tokens)),
        Line::from(format!(
            "Requests: {} (avg {:.1} tok)",
            o.total_requests, o.avg_tokens_per_request
        )),
    ];
    for top in usage.top_models.iter().take(3) {
        lines.push(Line::from(Span::styled(
            format!("  {} {}", top.name, top.total_tokens),
            Style::default().fg(Color::DarkGray),
        )));
    }
    Paragraph::new(lines)
}

fn server_list(servers: &[ServerConfig], marks: ServerMarks<'_>) -> List<'static> {
    let items: Vec<ListItem> = servers
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let cursor = if idx == marks.selected { "> " } else { "  " };
            let (dot, color) = if s.enabled {
                ("● ", Color::Green)
            } else {
                ("○ ", Color::DarkGray)
            };
            let mut spans = vec![
                Span::raw(cursor),
                Span::styled(dot, Style::default().fg(color)),
                Span::raw(s.name.clone()),
                Span::styled(
                    format!(" {}x GPU", s.gpu_count),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if marks.terminal_target == Some(s.name.as_str()) {
                spans.push(Span::styled(" [term]", Style::default().fg(Color::Cyan)));
            }
            let mut item = ListItem::new(Line::from(spans));
            if idx == marks.selected {
                item = item.style(Style::default().add_modifier(Modifier::BOLD));
            }
            item
        })
        .collect();
    List::new(items)
}
