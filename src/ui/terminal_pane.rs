use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::terminal::{CellAttrs, ScreenState, SessionState, TermColor};

/// Terminal pane widget showing the remote shell.
pub struct TerminalPane<'a> {
    screen: &'a ScreenState,
    state: &'a SessionState,
    target: Option<&'a str>,
    scroll_offset: usize,
    focused: bool,
}

impl<'a> TerminalPane<'a> {
    pub fn new(
        screen: &'a ScreenState,
        state: &'a SessionState,
        target: Option<&'a str>,
        scroll_offset: usize,
        focused: bool,
    ) -> Self {
        Self {
            screen,
            state,
            target,
            scroll_offset,
            focused,
        }
    }

    fn title(&self) -> String {
        let mut title = match self.target {
            Some(server) => format!(" Terminal: {} [{}] ", server, self.state.label()),
            None => " Terminal ".to_string(),
        };
        if self.scroll_offset > 0 {
            title.push_str(&format!("[SCROLLED: -{}] ", self.scroll_offset));
        }
        title
    }
}

impl<'a> Widget for TerminalPane<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = match (self.focused, self.state) {
            (_, SessionState::Error { .. }) => Style::default().fg(Color::Red),
            (true, _) => Style::default().fg(Color::Cyan),
            (false, _) => Style::default().fg(Color::DarkGray),
        };

        let block = Block::default()
            .title(self.title())
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner_area = block.inner(area);
        block.render(area, buf);

        let empty = self.screen.rows.iter().all(|r| r.cells.iter().all(|c| c.contents.is_empty()));
        if empty && *self.state == SessionState::Idle {
            let placeholder = "Select a server and press Enter to open a shell";
            let x = inner_area.x + (inner_area.width.saturating_sub(placeholder.len() as u16)) / 2;
            let y = inner_area.y + inner_area.height / 2;
            if y < inner_area.y + inner_area.height && x < inner_area.x + inner_area.width {
                buf.set_string(x, y, placeholder, Style::default().fg(Color::DarkGray));
            }
            return;
        }

        let show_cursor = self.focused && self.state.is_connected();
        render_screen_state(self.screen, inner_area, buf, self.scroll_offset, show_cursor);
    }
}

fn render_screen_state(
    screen: &ScreenState,
    area: Rect,
    buf: &mut Buffer,
    scroll_offset: usize,
    show_cursor: bool,
) {
    for (row_idx, screen_row) in screen.rows.iter().enumerate() {
        if row_idx as u16 >= area.height {
            break;
        }
        let y = area.y + row_idx as u16;

        for (col_idx, cell) in screen_row.cells.iter().enumerate() {
            if col_idx as u16 >= area.width {
                break;
            }
            if !cell.contents.is_empty() {
                let x = area.x + col_idx as u16;
                buf.set_string(x, y, &cell.contents, convert_cell_style(cell.fg, cell.bg, &cell.attrs));
            }
        }
    }

    // Only render cursor when at live view (not scrolled)
    if show_cursor && scroll_offset == 0 && screen.cursor_visible {
        let (cursor_row, cursor_col) = screen.cursor;
        let cursor_x = area.x + cursor_col;
        let cursor_y = area.y + cursor_row;

        if cursor_y < area.y + area.height && cursor_x < area.x + area.width {
            if let Some(cell) = buf.cell_mut((cursor_x, cursor_y)) {
                cell.set_style(Style::default().bg(Color::White).fg(Color::Black));
            }
        }
    }
}

fn convert_cell_style(fg: TermColor, bg: TermColor, attrs: &CellAttrs) -> Style {
    let mut style = Style::default().fg(fg.to_ratatui()).bg(bg.to_ratatui());

    if attrs.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if attrs.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if attrs.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if attrs.inverse {
        style = style.add_modifier(Modifier::REVERSED);
    }

    style
}
