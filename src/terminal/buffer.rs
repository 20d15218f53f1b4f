//! Bounded output buffer behind the terminal pane.
//!
//! Output is kept as logical lines of at most [`MAX_LINE_BYTES`]. Once the
//! buffer grows past `max_lines` the oldest `evict_batch` lines are dropped
//! together. Rendering replays only the lines that reach the view through a
//! fresh vt100 emulator sized to the pane.

use std::collections::VecDeque;

use super::screen::ScreenState;

/// Longest logical line kept; longer output is split into several lines
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Origin of a buffered line; decides how it is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Shell output, rendered as-is
    Output,
    /// `connected` greeting
    Banner,
    /// Inline `error` frame
    ServerError,
    /// Locally generated termination notice
    Notice,
}

impl LineKind {
    /// SGR prefix applied while replaying the line
    fn style(self) -> Option<&'static str> {
        match self {
            LineKind::Output => None,
            LineKind::Banner => Some("\x1b[32m"),
            LineKind::ServerError => Some("\x1b[33m"),
            LineKind::Notice => Some("\x1b[1;7;31m"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferLine {
    pub kind: LineKind,
    pub text: String,
}

/// Bounded line buffer with a scrollback view.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    lines: VecDeque<BufferLine>,
    /// Output after the last newline; continues on the next append
    partial: String,
    max_lines: usize,
    evict_batch: usize,
    /// Rows scrolled up from the live bottom (0 = live)
    scroll_offset: usize,
    /// Whether the view stays put while output arrives
    scroll_locked: bool,
}

impl OutputBuffer {
    pub fn new(max_lines: usize, evict_batch: usize) -> Self {
        let max_lines = max_lines.max(1);
        Self {
            lines: VecDeque::with_capacity(max_lines + 1),
            partial: String::new(),
            max_lines,
            evict_batch: evict_batch.clamp(1, max_lines),
            scroll_offset: 0,
            scroll_locked: false,
        }
    }

    /// Number of rendered lines, counting an unterminated last line
    pub fn len(&self) -> usize {
        self.lines.len() + usize::from(!self.partial.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lines(&self) -> impl Iterator<Item = &BufferLine> {
        self.lines.iter()
    }

    /// Text of the most recent line, terminated or not
    pub fn last_line(&self) -> Option<&str> {
        if !self.partial.is_empty() {
            return Some(&self.partial);
        }
        self.lines.back().map(|l| l.text.as_str())
    }

    /// Append raw shell output.
    pub fn push_output(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        let mut parts = data.split('\n');
        if let Some(first) = parts.next() {
            self.partial.push_str(first);
            self.split_long_partial();
        }
        for part in parts {
            let text = std::mem::replace(&mut self.partial, part.to_string());
            self.lines.push_back(BufferLine {
                kind: LineKind::Output,
                text,
            });
            self.split_long_partial();
        }
        self.after_append();
    }

    /// Commit the head of an overlong unterminated line so it gets evicted
    /// like any other line.
    fn split_long_partial(&mut self) {
        while self.partial.len() > MAX_LINE_BYTES {
            let mut at = MAX_LINE_BYTES;
            while !self.partial.is_char_boundary(at) {
                at -= 1;
            }
            let rest = self.partial.split_off(at);
            let text = std::mem::replace(&mut self.partial, rest);
            self.lines.push_back(BufferLine {
                kind: LineKind::Output,
                text,
            });
        }
    }

    /// Append a complete styled line on its own row.
    pub fn push_line(&mut self, kind: LineKind, text: &str) {
        self.flush_partial();
        // Server messages arrive terminated with "\r\n"
        let text = text.strip_suffix('\n').unwrap_or(text);
        for line in text.split('\n') {
            self.lines.push_back(BufferLine {
                kind,
                text: line.trim_end_matches('\r').to_string(),
            });
        }
        self.after_append();
    }

    /// Wipe everything and return to the live view
    pub fn clear(&mut self) {
        self.lines.clear();
        self.partial.clear();
        self.scroll_to_bottom();
    }

    fn flush_partial(&mut self) {
        if !self.partial.is_empty() {
            let text = std::mem::take(&mut self.partial);
            self.lines.push_back(BufferLine {
                kind: LineKind::Output,
                text,
            });
        }
    }

    fn after_append(&mut self) {
        self.evict();
        // Snap back to the live bottom unless the operator scrolled away
        if !self.scroll_locked {
            self.scroll_offset = 0;
        }
    }

    /// Drop the oldest batch whenever the buffer exceeds its cap.
    fn evict(&mut self) {
        while self.len() > self.max_lines && !self.lines.is_empty() {
            let n = self.evict_batch.min(self.lines.len());
            self.lines.drain(..n);
        }
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_offset = self
            .scroll_offset
            .saturating_add(rows)
            .min(self.len().saturating_sub(1));
        if self.scroll_offset > 0 {
            self.scroll_locked = true;
        }
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(rows);
        if self.scroll_offset == 0 {
            self.scroll_locked = false;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
        self.scroll_locked = false;
    }

    /// Render the current view into a `rows` x `cols` screen.
    ///
    /// `scroll_offset` counts logical lines back from the newest one. Only the
    /// lines ending at that position are replayed, at most one per row.
    pub fn render(&mut self, rows: u16, cols: u16) -> ScreenState {
        let rows = rows.max(1);
        let cols = cols.max(1);

        let total = self.len();
        self.scroll_offset = self.scroll_offset.min(total.saturating_sub(1));
        if self.scroll_offset == 0 {
            self.scroll_locked = false;
        }
        let live = self.scroll_offset == 0;
        // The live view keeps an empty row for the cursor after a finished line
        let cursor_row = live && self.partial.is_empty() && total > 0;

        let end = total - self.scroll_offset;
        let budget = usize::from(rows) - usize::from(cursor_row);
        let start = end.saturating_sub(budget);

        let mut parser = vt100::Parser::new(rows, cols, 0);
        for (i, idx) in (start..end).enumerate() {
            if i > 0 {
                parser.process(b"\r\n");
            }
            match self.lines.get(idx) {
                Some(line) => match line.kind.style() {
                    Some(sgr) => {
                        parser.process(sgr.as_bytes());
                        parser.process(line.text.as_bytes());
                        parser.process(b"\x1b[0m");
                    }
                    None => parser.process(line.text.as_bytes()),
                },
                None => parser.process(self.partial.as_bytes()),
            }
        }
        if cursor_row && end > start {
            parser.process(b"\r\n");
        }

        let mut screen = ScreenState::from_vt100(&parser);
        if !live {
            screen.cursor_visible = false;
        }
        screen
    }
}
