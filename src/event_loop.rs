use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use crossterm::event::EventStream;
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep_until, Instant, MissedTickBehavior};

use crate::app::{App, Focus};
use crate::event::Event;
use crate::handlers::keyboard::{handle_key_event, KeyAction};
use crate::handlers::mouse::handle_mouse_event;
use crate::scheduler::{Domain, SchedulerEvent};
use crate::terminal::SocketEvent;
use crate::ui::layout::dashboard_layout;
use crate::ui::panels::{RegionPanel, ServerMarks};
use crate::ui::terminal_pane::TerminalPane;
use crate::ui::toast_widget::{ToastPosition, ToastWidget};

/// How often the hidden-grace deadline and toasts are checked
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_millis(250);

/// Run the console until the operator quits.
///
/// Everything is serialized through this loop: terminal input, timer ticks,
/// fetch results and socket events.
pub async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut scheduler_rx: UnboundedReceiver<SchedulerEvent>,
    mut socket_rx: UnboundedReceiver<SocketEvent>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut housekeeping = tokio::time::interval(HOUSEKEEPING_INTERVAL);
    housekeeping.set_missed_tick_behavior(MissedTickBehavior::Skip);

    app.dashboard.start_up();

    loop {
        app.toast_manager.update();
        app.clamp_selection();
        app.refresh_screen();
        terminal.draw(|f| draw_ui(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        let resize_deadline = app.dashboard.bridge.resize_deadline();
        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => {
                    if handle_event(app, Event::from_crossterm(event)) == KeyAction::Quit {
                        return Ok(());
                    }
                }
                Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                None => return Ok(()),
            },

            Some(event) = scheduler_rx.recv() => {
                app.dashboard.handle_scheduler_event(event);
                while let Ok(event) = scheduler_rx.try_recv() {
                    app.dashboard.handle_scheduler_event(event);
                }
            }

            Some(event) = socket_rx.recv() => {
                // Drain bursts of output before redrawing
                app.dashboard.handle_socket_event(event);
                while let Ok(event) = socket_rx.try_recv() {
                    app.dashboard.handle_socket_event(event);
                }
            }

            _ = sleep_until(resize_deadline.unwrap_or_else(Instant::now)), if resize_deadline.is_some() => {
                app.dashboard.bridge.poll_resize(Instant::now());
            }

            _ = housekeeping.tick() => {
                app.dashboard.check_hidden_grace(Instant::now());
            }
        }
    }
}

fn handle_event(app: &mut App, event: Event) -> KeyAction {
    let now = Instant::now();
    match event {
        Event::Key(key) => return handle_key_event(app, key, now),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(w, h) => app.resize(w, h, now),
        Event::Focus(focused) => app.on_focus_change(focused, now),
        Event::Paste(text) => {
            if app.focus == Focus::Terminal {
                app.dashboard.bridge.send_input(&text);
            }
        }
    }
    KeyAction::Continue
}

fn draw_ui(f: &mut Frame, app: &App) {
    let layout = dashboard_layout(f.area());
    let regions = &app.dashboard.regions;
    let panels_focused = app.focus == Focus::Panels;

    for (domain, area) in [
        (Domain::Gpu, layout.gpu),
        (Domain::System, layout.system),
        (Domain::Models, layout.models),
        (Domain::Tokens, layout.tokens),
    ] {
        f.render_widget(RegionPanel::new(domain, regions.get(domain)), area);
    }

    let marks = ServerMarks {
        selected: app.selected_server,
        terminal_target: app.dashboard.bridge.target(),
    };
    f.render_widget(
        RegionPanel::new(Domain::Config, regions.get(Domain::Config))
            .marks(marks)
            .focused(panels_focused),
        layout.servers,
    );

    let bridge = &app.dashboard.bridge;
    f.render_widget(
        TerminalPane::new(
            &app.screen,
            bridge.state(),
            bridge.target(),
            bridge.buffer().scroll_offset(),
            app.focus == Focus::Terminal,
        ),
        layout.terminal,
    );

    draw_help_bar(f, layout.help, app);

    let toasts: Vec<_> = app.toast_manager.visible_toasts();
    if !toasts.is_empty() {
        let area = f.area();
        ToastWidget::new(&toasts)
            .position(ToastPosition::TopRight)
            .render(f, area);
    }
}

fn draw_help_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![build_mode_indicator(app)];
    if !app.dashboard.is_visible() {
        spans.push(Span::styled(
            " PAUSED ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
    }

    let hints: &[(&str, &str)] = match app.focus {
        Focus::Panels => &[
            ("j/k", "server"),
            ("Enter", "connect"),
            ("d", "disconnect"),
            ("x", "clear"),
            ("t", "terminal"),
            ("r", "refresh"),
            ("p", "pause"),
            ("q", "quit"),
        ],
        Focus::Terminal => &[
            ("C-h", "panels"),
            ("S-PgUp/PgDn", "scroll"),
            ("C-q", "quit"),
        ],
    };
    for (key, action) in hints {
        spans.push(Span::styled(
            format!(" {key}"),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::raw(format!(" {action}")));
    }

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    f.render_widget(help, area);
}

fn build_mode_indicator(app: &App) -> Span<'static> {
    match app.focus {
        Focus::Panels => Span::styled(
            " PANELS ",
            Style::default().fg(Color::Black).bg(Color::Blue),
        ),
        Focus::Terminal => Span::styled(
            " TERMINAL ",
            Style::default().fg(Color::Black).bg(Color::Green),
        ),
    }
}
