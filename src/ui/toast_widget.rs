use crate::ui::toast::{Toast, ToastType};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub struct ToastWidget<'a> {
    toasts: &'a [&'a Toast],
    position: ToastPosition,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum ToastPosition {
    #[default]
    BottomRight,
    TopRight,
}

impl<'a> ToastWidget<'a> {
    pub fn new(toasts: &'a [&'a Toast]) -> Self {
        Self {
            toasts,
            position: ToastPosition::default(),
        }
    }

    pub fn position(mut self, pos: ToastPosition) -> Self {
        self.position = pos;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        if self.toasts.is_empty() {
            return;
        }

        let toast_width = 44u16;
        let toast_height = 4u16;
        let gap = 1u16;

        for (idx, toast) in self.toasts.iter().enumerate() {
            let toast_area =
                self.calculate_position(area, toast_width, toast_height, idx as u16, gap);

            frame.render_widget(Clear, toast_area);

            let border_style = border_style(toast.toast_type);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .style(Style::default().bg(Color::Black));

            let text = Paragraph::new(Line::from(vec![
                Span::styled(
                    icon(toast.toast_type),
                    border_style.add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::raw(toast.message.clone()),
            ]))
            .block(block)
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Left);

            frame.render_widget(text, toast_area);
        }
    }

    fn calculate_position(
        &self,
        area: Rect,
        width: u16,
        height: u16,
        index: u16,
        gap: u16,
    ) -> Rect {
        let offset = index * (height + gap);
        let x = area.right().saturating_sub(width + 2);
        let y = match self.position {
            ToastPosition::BottomRight => area.bottom().saturating_sub(height + 2 + offset),
            ToastPosition::TopRight => area.top() + 1 + offset,
        };

        Rect::new(x, y, width.min(area.width), height.min(area.height))
    }
}

fn icon(toast_type: ToastType) -> &'static str {
    match toast_type {
        ToastType::Info => "ℹ",
        ToastType::Success => "✓",
        ToastType::Warning => "⚠",
        ToastType::Error => "✗",
    }
}

fn border_style(toast_type: ToastType) -> Style {
    let color = match toast_type {
        ToastType::Info => Color::Cyan,
        ToastType::Success => Color::Green,
        ToastType::Warning => Color::Yellow,
        ToastType::Error => Color::Red,
    };
    Style::default().fg(color)
}
