use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::app::{App, Focus};

/// Rows per wheel step
const SCROLL_LINES: usize = 3;

/// Whether a screen position falls inside the terminal pane's content.
pub(crate) fn in_terminal(app: &App, col: u16, row: u16) -> bool {
    let Some(inner) = app.terminal_inner_area else {
        return false;
    };
    col >= inner.x && col < inner.x + inner.width && row >= inner.y && row < inner.y + inner.height
}

pub(crate) fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Clicking a pane focuses it
        MouseEventKind::Down(MouseButton::Left) => {
            app.focus = if in_terminal(app, mouse.column, mouse.row) {
                Focus::Terminal
            } else {
                Focus::Panels
            };
        }
        MouseEventKind::ScrollUp if in_terminal(app, mouse.column, mouse.row) => {
            app.scroll_up(SCROLL_LINES);
        }
        MouseEventKind::ScrollDown if in_terminal(app, mouse.column, mouse.row) => {
            app.scroll_down(SCROLL_LINES);
        }
        _ => {}
    }
}
