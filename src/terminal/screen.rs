//! Rendered terminal screen, extracted from a vt100 emulator.
//!
//! The UI only ever sees these plain types, never the emulator itself.

/// Terminal screen state for rendering.
#[derive(Debug, Clone, Default)]
pub struct ScreenState {
    /// Visible rows, top to bottom
    pub rows: Vec<ScreenRow>,
    /// Cursor position (row, col)
    pub cursor: (u16, u16),
    pub cursor_visible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenRow {
    pub cells: Vec<ScreenCell>,
}

/// A single cell on the terminal screen.
#[derive(Debug, Clone)]
pub struct ScreenCell {
    /// The character(s) in this cell
    pub contents: String,
    pub fg: TermColor,
    pub bg: TermColor,
    pub attrs: CellAttrs,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TermColor {
    #[default]
    Default,
    /// 256-color palette index
    Indexed(u8),
    Rgb(u8, u8, u8),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellAttrs {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub inverse: bool,
}

impl TermColor {
    pub fn from_vt100(color: vt100::Color) -> Self {
        match color {
            vt100::Color::Default => TermColor::Default,
            vt100::Color::Idx(idx) => TermColor::Indexed(idx),
            vt100::Color::Rgb(r, g, b) => TermColor::Rgb(r, g, b),
        }
    }

    pub fn to_ratatui(self) -> ratatui::style::Color {
        match self {
            TermColor::Default => ratatui::style::Color::Reset,
            TermColor::Indexed(idx) => ratatui::style::Color::Indexed(idx),
            TermColor::Rgb(r, g, b) => ratatui::style::Color::Rgb(r, g, b),
        }
    }
}

impl CellAttrs {
    pub fn from_vt100_cell(cell: &vt100::Cell) -> Self {
        Self {
            bold: cell.bold(),
            italic: cell.italic(),
            underline: cell.underline(),
            inverse: cell.inverse(),
        }
    }
}

impl ScreenState {
    /// Snapshot the parser's current view.
    pub fn from_vt100(parser: &vt100::Parser) -> Self {
        let screen = parser.screen();
        let (rows, cols) = screen.size();

        let mut screen_rows = Vec::with_capacity(rows as usize);
        for row_idx in 0..rows {
            let mut cells = Vec::with_capacity(cols as usize);
            for col_idx in 0..cols {
                let Some(cell) = screen.cell(row_idx, col_idx) else {
                    continue;
                };
                cells.push(ScreenCell {
                    contents: cell.contents(),
                    fg: TermColor::from_vt100(cell.fgcolor()),
                    bg: TermColor::from_vt100(cell.bgcolor()),
                    attrs: CellAttrs::from_vt100_cell(cell),
                });
            }
            screen_rows.push(ScreenRow { cells });
        }

        ScreenState {
            rows: screen_rows,
            cursor: screen.cursor_position(),
            cursor_visible: !screen.hide_cursor(),
        }
    }

    /// Plain text of one row, trailing blanks trimmed
    pub fn row_text(&self, row: usize) -> String {
        self.rows
            .get(row)
            .map(|r| r.cells.iter().map(|c| c.contents.as_str()).collect::<String>())
            .unwrap_or_default()
            .trim_end()
            .to_string()
    }
}
