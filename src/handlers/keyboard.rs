use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::time::Instant;

use crate::app::{App, Focus, SCROLL_PAGE};

/// Action returned from key handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Continue,
    Quit,
}

pub(crate) fn handle_key_event(app: &mut App, key: KeyEvent, now: Instant) -> KeyAction {
    // Windows reports releases too
    if key.kind == KeyEventKind::Release {
        return KeyAction::Continue;
    }

    // Ctrl+Q quits from anywhere
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return KeyAction::Quit;
    }

    match app.focus {
        Focus::Panels => handle_panels_key(app, key, now),
        Focus::Terminal => handle_terminal_key(app, key),
    }
}

fn handle_panels_key(app: &mut App, key: KeyEvent, now: Instant) -> KeyAction {
    match key.code {
        KeyCode::Char('q') => {
            app.quit();
            return KeyAction::Quit;
        }
        KeyCode::Char('r') => app.manual_refresh(),
        KeyCode::Char('p') => app.toggle_pause(now),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Enter | KeyCode::Char('c') => app.connect_selected(),
        KeyCode::Char('d') => app.disconnect(),
        KeyCode::Char('x') => app.clear_terminal(),
        KeyCode::Char('t') | KeyCode::Tab => app.focus = Focus::Terminal,
        KeyCode::PageUp => app.scroll_up(SCROLL_PAGE),
        KeyCode::PageDown => app.scroll_down(SCROLL_PAGE),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_terminal_key(app: &mut App, key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        (KeyCode::Char('h'), m) if m.contains(KeyModifiers::CONTROL) => {
            app.focus = Focus::Panels;
        }
        (KeyCode::PageUp, m) if m.contains(KeyModifiers::SHIFT) => app.scroll_up(SCROLL_PAGE),
        (KeyCode::PageDown, m) if m.contains(KeyModifiers::SHIFT) => {
            app.scroll_down(SCROLL_PAGE)
        }
        _ => {
            if let Some(input) = key_to_input(key) {
                app.dashboard.bridge.send_input(&input);
            }
        }
    }
    KeyAction::Continue
}

/// Encode a key press the way a terminal would send it to a shell.
pub(crate) fn key_to_input(key: KeyEvent) -> Option<String> {
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let encoded = match (key.code, key.modifiers.difference(KeyModifiers::ALT)) {
        (KeyCode::Char(c), m) if m.contains(KeyModifiers::CONTROL) => {
            // Control characters: Ctrl+A = 0x01, Ctrl+B = 0x02, etc.
            match c.to_ascii_lowercase() {
                l @ 'a'..='z' => ((l as u8 - b'a' + 1) as char).to_string(),
                ' ' | '@' => "\0".to_string(),
                '[' => "\x1b".to_string(),
                '\\' => "\x1c".to_string(),
                ']' => "\x1d".to_string(),
                _ => return None,
            }
        }
        (KeyCode::Char(c), _) => c.to_string(),
        (KeyCode::Enter, _) => "\r".to_string(),
        (KeyCode::Backspace, _) => "\x7f".to_string(),
        (KeyCode::Tab, _) => "\t".to_string(),
        (KeyCode::BackTab, _) => "\x1b[Z".to_string(),
        (KeyCode::Esc, _) => "\x1b".to_string(),
        (KeyCode::Up, _) => "\x1b[A".to_string(),
        (KeyCode::Down, _) => "\x1b[B".to_string(),
        (KeyCode::Right, _) => "\x1b[C".to_string(),
        (KeyCode::Left, _) => "\x1b[D".to_string(),
        (KeyCode::Home, _) => "\x1b[H".to_string(),
        (KeyCode::End, _) => "\x1b[F".to_string(),
        (KeyCode::PageUp, _) => "\x1b[5~".to_string(),
        (KeyCode::PageDown, _) => "\x1b[6~".to_string(),
        (KeyCode::Insert, _) => "\x1b[2~".to_string(),
        (KeyCode::Delete, _) => "\x1b[3~".to_string(),
        (KeyCode::F(n @ 1..=4), _) => format!("\x1bO{}", (b'P' + n - 1) as char),
        (KeyCode::F(n @ 5..=12), _) => {
            let code = [15, 17, 18, 19, 20, 21, 23, 24][usize::from(n - 5)];
            format!("\x1b[{code}~")
        }
        _ => return None,
    };
    // Alt prefixes the sequence with ESC
    Some(if alt { format!("\x1b{encoded}") } else { encoded })
}
