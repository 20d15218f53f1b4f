//! Application state: the dashboard plus everything the TUI adds around it.

use ratatui::layout::Rect;
use tokio::time::Instant;
use tracing::info;

use crate::api::ServerConfig;
use crate::config::Config;
use crate::lifecycle::Dashboard;
use crate::terminal::{ScreenState, Viewport};
use crate::ui::layout::{dashboard_layout, inner};
use crate::ui::toast::{ToastManager, ToastType};

/// Rows scrolled per Shift+PageUp/PageDown or wheel step
pub const SCROLL_PAGE: usize = 10;

/// Which part of the screen has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Data panels and server list
    #[default]
    Panels,
    /// Keys go to the remote shell
    Terminal,
}

pub struct App {
    pub config: Config,
    pub dashboard: Dashboard,
    pub focus: Focus,
    /// Index into the server list
    pub selected_server: usize,
    pub toast_manager: ToastManager,
    pub should_quit: bool,
    pub term_size: (u16, u16),
    /// Terminal pane minus its border, cached for mouse mapping
    pub terminal_inner_area: Option<Rect>,
    /// Rendered terminal view, rebuilt before each draw
    pub screen: ScreenState,
    /// Operator pressed the pause key; focus changes never undo this
    pub paused: bool,
    /// Whether the host terminal window has focus
    pub window_focused: bool,
}

impl App {
    pub fn new(config: Config, dashboard: Dashboard) -> Self {
        Self {
            config,
            dashboard,
            focus: Focus::default(),
            selected_server: 0,
            toast_manager: ToastManager::new(),
            should_quit: false,
            term_size: (0, 0),
            terminal_inner_area: None,
            screen: ScreenState::default(),
            paused: false,
            window_focused: true,
        }
    }

    /// Last known server list (empty until the first config load)
    pub fn servers(&self) -> &[ServerConfig] {
        self.dashboard.regions.servers().unwrap_or(&[])
    }

    pub fn selected_server_name(&self) -> Option<&str> {
        self.servers()
            .get(self.selected_server)
            .map(|s| s.name.as_str())
    }

    pub fn select_next(&mut self) {
        let len = self.servers().len();
        if len > 0 {
            self.selected_server = (self.selected_server + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_server = self.selected_server.saturating_sub(1);
    }

    /// Keep the selection inside the list after it changed size
    pub fn clamp_selection(&mut self) {
        let len = self.servers().len();
        self.selected_server = self.selected_server.min(len.saturating_sub(1));
    }

    /// Connect the terminal to the selected server; validation errors become toasts.
    pub fn connect_selected(&mut self) {
        let server = self.selected_server_name().unwrap_or_default().to_string();
        match self.dashboard.connect(&server) {
            Ok(()) => {
                self.focus = Focus::Terminal;
                self.toast_manager
                    .push(format!("Connecting to {server}"), ToastType::Info);
            }
            Err(e) => {
                info!(event = "app.connect.rejected", server = %server, error = %e);
                self.toast_manager.push(e.to_string(), ToastType::Error);
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.dashboard.bridge.disconnect();
    }

    pub fn clear_terminal(&mut self) {
        self.dashboard.bridge.clear();
    }

    pub fn manual_refresh(&mut self) {
        let dispatched = self.dashboard.refresh_all();
        let message = if dispatched == 0 {
            "Refresh already in progress".to_string()
        } else {
            format!("Refreshing {dispatched} panels")
        };
        self.toast_manager.push(message, ToastType::Info);
    }

    /// Operator pause key: hide/show the console by hand
    pub fn toggle_pause(&mut self, now: Instant) {
        self.paused = !self.paused;
        self.update_visibility(now);
        let (message, kind) = if self.paused {
            ("Live refresh paused", ToastType::Warning)
        } else {
            ("Live refresh resumed", ToastType::Success)
        };
        self.toast_manager.push(message, kind);
    }

    /// Terminal window focus change
    pub fn on_focus_change(&mut self, focused: bool, now: Instant) {
        self.window_focused = focused;
        self.update_visibility(now);
    }

    /// The console counts as visible unless paused by hand or, when
    /// configured, unfocused.
    fn update_visibility(&mut self, now: Instant) {
        let focused = self.window_focused || !self.config.refresh.pause_when_unfocused;
        self.dashboard.set_visible(!self.paused && focused, now);
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.dashboard.bridge.buffer_mut().scroll_up(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.dashboard.bridge.buffer_mut().scroll_down(rows);
    }

    /// Recompute the terminal viewport for a new screen size.
    pub fn resize(&mut self, width: u16, height: u16, now: Instant) {
        self.term_size = (width, height);
        let layout = dashboard_layout(Rect::new(0, 0, width, height));
        let pane = inner(layout.terminal);
        self.terminal_inner_area = Some(pane);
        self.dashboard
            .bridge
            .set_viewport(Viewport::new(pane.width, pane.height), now);
    }

    /// Rebuild the terminal view at the current viewport
    pub fn refresh_screen(&mut self) {
        let viewport = self.dashboard.bridge.viewport();
        self.screen = self
            .dashboard
            .bridge
            .buffer_mut()
            .render(viewport.rows, viewport.cols);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
