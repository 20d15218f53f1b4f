pub use crossterm::event::{Event as CrosstermEvent, KeyEvent, MouseEvent};

/// Terminal input the application reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Keyboard input
    Key(KeyEvent),
    /// Mouse input
    Mouse(MouseEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Terminal window gained (`true`) or lost focus
    Focus(bool),
    /// Bracketed paste
    Paste(String),
}

impl Event {
    pub fn from_crossterm(event: CrosstermEvent) -> Self {
        match event {
            CrosstermEvent::Key(key) => Event::Key(key),
            CrosstermEvent::Mouse(mouse) => Event::Mouse(mouse),
            CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
            CrosstermEvent::FocusGained => Event::Focus(true),
            CrosstermEvent::FocusLost => Event::Focus(false),
            CrosstermEvent::Paste(text) => Event::Paste(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_events_map() {
        assert_eq!(
            Event::from_crossterm(CrosstermEvent::FocusLost),
            Event::Focus(false)
        );
        assert_eq!(
            Event::from_crossterm(CrosstermEvent::Resize(80, 24)),
            Event::Resize(80, 24)
        );
    }
}
