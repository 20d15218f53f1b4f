//! The terminal bridge: owns the session state, the socket and the buffer.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::buffer::{LineKind, OutputBuffer};
use super::frame::{ClientFrame, ServerFrame};
use super::resize::{ResizeCoalescer, Viewport};
use super::socket::{Connector, SocketEvent, SocketEventKind, SocketHandle};
use super::state::{CloseReason, DisconnectReason, SessionEvent, SessionState};
use super::BridgeError;
use crate::api::ServerConfig;
use crate::config::Config;

/// Mediates between the terminal pane and one remote shell socket.
pub struct TerminalBridge {
    config: Config,
    connector: Arc<dyn Connector>,
    events: UnboundedSender<SocketEvent>,
    state: SessionState,
    /// Server the current (or last) session targets
    target: Option<String>,
    /// Sequence number of the current session; bumps on every connect
    session: u64,
    socket: Option<SocketHandle>,
    buffer: OutputBuffer,
    viewport: Viewport,
    resize: ResizeCoalescer,
}

impl TerminalBridge {
    pub fn new(
        config: &Config,
        connector: Arc<dyn Connector>,
        events: UnboundedSender<SocketEvent>,
    ) -> Self {
        Self {
            config: config.clone(),
            connector,
            events,
            state: SessionState::Idle,
            target: None,
            session: 0,
            socket: None,
            buffer: OutputBuffer::new(config.terminal.max_lines, config.terminal.evict_batch),
            viewport: Viewport::default(),
            resize: ResizeCoalescer::new(config.terminal.resize_delay()),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn buffer(&self) -> &OutputBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut OutputBuffer {
        &mut self.buffer
    }

    fn apply(&mut self, event: SessionEvent) {
        let next = self.state.transition(&event);
        if next != self.state {
            info!(
                event = "terminal.session.transition",
                session = self.session,
                from = %self.state.label(),
                to = %next.label(),
            );
        }
        self.state = next;
    }

    /// Open a session to `server`, replacing any active one.
    ///
    /// `servers` is the last known server list; validation failures leave the
    /// bridge untouched and open nothing.
    pub fn connect(
        &mut self,
        server: &str,
        servers: Option<&[ServerConfig]>,
    ) -> Result<(), BridgeError> {
        let server = server.trim();
        if server.is_empty() {
            return Err(BridgeError::NoServerSelected);
        }
        let servers = servers.ok_or(BridgeError::ServerListUnavailable)?;
        let entry = servers
            .iter()
            .find(|s| s.name == server)
            .ok_or_else(|| BridgeError::UnknownServer(server.to_string()))?;
        if !entry.enabled {
            return Err(BridgeError::ServerDisabled(server.to_string()));
        }
        let url = self
            .config
            .terminal_endpoint(server)
            .map_err(|e| BridgeError::Endpoint(e.to_string()))?;

        if self.state.is_active() {
            self.close_socket();
            self.apply(SessionEvent::Disconnect(DisconnectReason::Replaced));
        }

        self.session += 1;
        self.resize.cancel();
        self.target = Some(server.to_string());
        self.apply(SessionEvent::Connect);
        info!(
            event = "terminal.session.connect_started",
            session = self.session,
            server = %server,
            url = %url,
        );
        self.socket = Some(self.connector.open(url, self.session, self.events.clone()));
        Ok(())
    }

    /// Close the active session. No-op unless connecting or connected.
    pub fn disconnect(&mut self) {
        if !self.state.is_active() {
            debug!(event = "terminal.session.disconnect_ignored", state = %self.state.label());
            return;
        }
        self.close_socket();
        self.resize.cancel();
        self.apply(SessionEvent::Disconnect(DisconnectReason::User));
        self.buffer.push_line(LineKind::Notice, "Disconnected");
    }

    /// Close any socket and return to `Idle`.
    pub fn teardown(&mut self) {
        self.close_socket();
        self.resize.cancel();
        self.apply(SessionEvent::Teardown);
        self.target = None;
    }

    fn close_socket(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.close();
        }
    }

    /// Forward keystrokes to the remote shell. Dropped unless connected.
    pub fn send_input(&mut self, data: &str) -> bool {
        if !self.state.is_connected() {
            debug!(event = "terminal.input.dropped", state = %self.state.label());
            return false;
        }
        self.buffer.scroll_to_bottom();
        self.send(ClientFrame::Input {
            data: data.to_string(),
        })
    }

    fn send(&mut self, frame: ClientFrame) -> bool {
        let Some(socket) = self.socket.as_ref() else {
            return false;
        };
        if socket.send_text(frame.encode()) {
            true
        } else {
            warn!(event = "terminal.socket.send_dropped", session = self.session);
            false
        }
    }

    /// Record a viewport change; the resize frame follows once changes settle.
    pub fn set_viewport(&mut self, viewport: Viewport, now: Instant) {
        if viewport == self.viewport && self.resize.deadline().is_none() {
            return;
        }
        self.viewport = viewport;
        self.resize.observe(viewport, now);
    }

    /// Deadline of the pending resize, if any
    pub fn resize_deadline(&self) -> Option<Instant> {
        self.resize.deadline()
    }

    /// Emit the coalesced resize frame if it is due and the session is connected.
    pub fn poll_resize(&mut self, now: Instant) -> Option<Viewport> {
        let viewport = self.resize.poll(now)?;
        if !self.state.is_connected() {
            return None;
        }
        self.send(ClientFrame::Resize {
            cols: viewport.cols,
            rows: viewport.rows,
        })
        .then_some(viewport)
    }

    /// Wipe the buffer; the session is unaffected
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Apply something the transport reported.
    pub fn handle_socket_event(&mut self, event: SocketEvent) {
        if event.session != self.session || self.socket.is_none() {
            debug!(
                event = "terminal.socket.stale_event",
                session = event.session,
                current = self.session,
            );
            return;
        }

        match event.kind {
            SocketEventKind::Opened => {
                self.apply(SessionEvent::Opened);
                if self.state.is_connected() {
                    self.buffer.clear();
                    // Match the remote pty to the visible geometry before any input
                    self.resize.cancel();
                    let viewport = self.viewport;
                    self.send(ClientFrame::Resize {
                        cols: viewport.cols,
                        rows: viewport.rows,
                    });
                }
            }
            SocketEventKind::Message(text) => self.handle_frame(&text),
            SocketEventKind::Closed { code, reason } => {
                self.socket = None;
                self.resize.cancel();
                let notice = CloseReason::from_close(code, &reason).notice();
                self.apply(SessionEvent::Closed {
                    code,
                    detail: reason,
                });
                self.buffer.push_line(LineKind::Notice, &notice);
            }
            SocketEventKind::Failed(detail) => {
                self.socket = None;
                self.resize.cancel();
                warn!(event = "terminal.session.failed", session = self.session, error = %detail);
                let notice = CloseReason::from_close(None, &detail).notice();
                self.apply(SessionEvent::Failed(detail));
                self.buffer.push_line(LineKind::Notice, &notice);
            }
        }
    }

    fn handle_frame(&mut self, text: &str) {
        match ServerFrame::parse(text) {
            Ok(ServerFrame::Output { data }) => self.buffer.push_output(&data),
            Ok(ServerFrame::Connected { message }) => {
                self.buffer.push_line(LineKind::Banner, &message)
            }
            Ok(ServerFrame::Error { message }) => {
                self.buffer.push_line(LineKind::ServerError, &message)
            }
            Err(e) => {
                warn!(
                    event = "terminal.frame.malformed",
                    session = self.session,
                    error = %e,
                    len = text.len(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::terminal::fake::FakeConnector;
    use crate::terminal::frame::ClientFrame;
    use crate::terminal::socket::Outbound;

    fn servers() -> Vec<ServerConfig> {
        let server = |name: &str, enabled: bool| ServerConfig {
            name: name.to_string(),
            host: "10.0.0.1".to_string(),
            port: 22,
            username: "ops".to_string(),
            gpu_count: 8,
            enabled,
            model_path: "/models".to_string(),
        };
        vec![
            server("gpu-a", true),
            server("gpu-b", true),
            server("gpu-off", false),
        ]
    }

    fn bridge() -> (TerminalBridge, FakeConnector) {
        let connector = FakeConnector::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let bridge = TerminalBridge::new(&Config::default(), Arc::new(connector.clone()), tx);
        (bridge, connector)
    }

    fn deliver(bridge: &mut TerminalBridge, kind: SocketEventKind) {
        let session = bridge.session();
        bridge.handle_socket_event(SocketEvent { session, kind });
    }

    fn connected(server: &str) -> (TerminalBridge, FakeConnector) {
        let (mut bridge, connector) = bridge();
        let list = servers();
        bridge.connect(server, Some(&list)).unwrap();
        deliver(&mut bridge, SocketEventKind::Opened);
        (bridge, connector)
    }

    fn close_with(code: u16, reason: &str) -> (SessionState, String) {
        let (mut bridge, _connector) = connected("gpu-a");
        deliver(
            &mut bridge,
            SocketEventKind::Closed {
                code: Some(code),
                reason: reason.to_string(),
            },
        );
        let notice = bridge.buffer().last_line().unwrap().to_string();
        (bridge.state().clone(), notice)
    }

    #[test]
    fn test_connect_validation_opens_nothing() {
        let (mut bridge, connector) = bridge();
        let list = servers();

        assert_eq!(
            bridge.connect("  ", Some(&list)),
            Err(BridgeError::NoServerSelected)
        );
        assert_eq!(
            bridge.connect("gpu-a", None),
            Err(BridgeError::ServerListUnavailable)
        );
        assert_eq!(
            bridge.connect("gpu-z", Some(&list)),
            Err(BridgeError::UnknownServer("gpu-z".to_string()))
        );
        assert_eq!(
            bridge.connect("gpu-off", Some(&list)),
            Err(BridgeError::ServerDisabled("gpu-off".to_string()))
        );

        assert_eq!(bridge.state(), &SessionState::Idle);
        assert!(connector.opened().is_empty());
    }

    #[test]
    fn test_validation_failure_keeps_active_session() {
        let (mut bridge, connector) = connected("gpu-a");
        let list = servers();
        assert!(bridge.connect("gpu-off", Some(&list)).is_err());

        assert_eq!(bridge.state(), &SessionState::Connected);
        assert_eq!(connector.live_count(), 1);
    }

    #[test]
    fn test_connect_replaces_previous_socket() {
        let (mut bridge, connector) = bridge();
        let list = servers();

        bridge.connect("gpu-a", Some(&list)).unwrap();
        bridge.connect("gpu-b", Some(&list)).unwrap();

        let opened = connector.opened();
        assert_eq!(opened.len(), 2);
        assert!(opened[1].0.as_str().ends_with("/ws/terminal/gpu-b"));
        assert!(connector.is_closed(0));
        assert!(!connector.is_closed(1));
        assert_eq!(connector.live_count(), 1);
        assert_eq!(bridge.state(), &SessionState::Connecting);
        assert_eq!(bridge.target(), Some("gpu-b"));
    }

    #[test]
    fn test_events_from_replaced_socket_are_ignored() {
        let (mut bridge, _connector) = bridge();
        let list = servers();
        bridge.connect("gpu-a", Some(&list)).unwrap();
        let old = bridge.session();
        bridge.connect("gpu-b", Some(&list)).unwrap();

        bridge.handle_socket_event(SocketEvent {
            session: old,
            kind: SocketEventKind::Opened,
        });
        assert_eq!(bridge.state(), &SessionState::Connecting);

        bridge.handle_socket_event(SocketEvent {
            session: old,
            kind: SocketEventKind::Closed {
                code: Some(1000),
                reason: String::new(),
            },
        });
        assert_eq!(bridge.state(), &SessionState::Connecting);
    }

    #[test]
    fn test_first_frame_after_open_is_resize() {
        let (mut bridge, connector) = bridge();
        let list = servers();
        bridge.set_viewport(Viewport::new(132, 43), Instant::now());
        bridge.connect("gpu-a", Some(&list)).unwrap();

        assert!(!bridge.send_input("early"));
        bridge.buffer_mut().push_output("stale\n");
        deliver(&mut bridge, SocketEventKind::Opened);
        assert!(bridge.buffer().is_empty());
        assert!(bridge.send_input("ls\r"));

        assert_eq!(
            connector.frames(0),
            vec![
                ClientFrame::Resize {
                    cols: 132,
                    rows: 43
                },
                ClientFrame::Input {
                    data: "ls\r".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_resize_burst_emits_one_frame() {
        let (mut bridge, connector) = connected("gpu-a");
        let start = Instant::now();

        bridge.set_viewport(Viewport::new(100, 30), start);
        bridge.set_viewport(Viewport::new(110, 35), start + Duration::from_millis(20));
        bridge.set_viewport(Viewport::new(120, 40), start + Duration::from_millis(45));

        assert_eq!(bridge.poll_resize(start + Duration::from_millis(50)), None);
        assert_eq!(
            bridge.poll_resize(start + Duration::from_millis(200)),
            Some(Viewport::new(120, 40))
        );
        assert_eq!(bridge.poll_resize(start + Duration::from_millis(400)), None);

        let resizes: Vec<ClientFrame> = connector
            .frames(0)
            .into_iter()
            .skip(1)
            .filter(|f| matches!(f, ClientFrame::Resize { .. }))
            .collect();
        assert_eq!(
            resizes,
            vec![ClientFrame::Resize {
                cols: 120,
                rows: 40
            }]
        );
    }

    #[test]
    fn test_resize_not_sent_unless_connected() {
        let (mut bridge, connector) = bridge();
        let list = servers();
        bridge.connect("gpu-a", Some(&list)).unwrap();
        let start = Instant::now();

        bridge.set_viewport(Viewport::new(90, 20), start);
        assert_eq!(bridge.poll_resize(start + Duration::from_secs(1)), None);
        assert!(connector.frames(0).is_empty());
        assert_eq!(bridge.viewport(), Viewport::new(90, 20));
    }

    #[test]
    fn test_close_codes_yield_error_and_distinct_notices() {
        let (state_4000, notice_4000) = close_with(4000, "no such server");
        let (state_4001, notice_4001) = close_with(4001, "disabled");
        let (state_4002, notice_4002) = close_with(4002, "ssh: connection refused");

        assert_eq!(
            state_4001,
            SessionState::Error {
                code: Some(4001),
                detail: "disabled".to_string()
            }
        );
        assert!(matches!(state_4000, SessionState::Error { code: Some(4000), .. }));
        assert!(matches!(state_4002, SessionState::Error { code: Some(4002), .. }));
        assert_ne!(notice_4001, notice_4000);
        assert_ne!(notice_4001, notice_4002);
        assert!(notice_4002.contains("ssh: connection refused"));
    }

    #[test]
    fn test_unexpected_close_is_connection_lost() {
        let (mut bridge, connector) = connected("gpu-a");
        deliver(
            &mut bridge,
            SocketEventKind::Closed {
                code: None,
                reason: String::new(),
            },
        );
        assert!(matches!(bridge.state(), SessionState::Error { code: None, .. }));
        assert_eq!(bridge.buffer().last_line(), Some("Connection lost"));
        assert!(!bridge.send_input("x"));
        // The peer closed; we have nothing left to send
        assert_eq!(connector.sent(0).len(), 1);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let (mut bridge, connector) = bridge();
        bridge.disconnect();
        assert_eq!(bridge.state(), &SessionState::Idle);
        assert!(connector.opened().is_empty());

        let (mut bridge, connector) = connected("gpu-a");
        bridge.disconnect();
        assert_eq!(
            bridge.state(),
            &SessionState::Disconnected(DisconnectReason::User)
        );
        assert!(connector.sent(0).contains(&Outbound::Close));
        bridge.disconnect();
        assert_eq!(
            bridge.state(),
            &SessionState::Disconnected(DisconnectReason::User)
        );
    }

    #[test]
    fn test_server_frames_render_and_malformed_are_swallowed() {
        let (mut bridge, _connector) = connected("gpu-a");

        deliver(
            &mut bridge,
            SocketEventKind::Message(r#"{"type":"connected","message":"welcome to gpu-a"}"#.into()),
        );
        deliver(
            &mut bridge,
            SocketEventKind::Message(r#"{"type":"output","data":"$ nvidia-smi\r\n"}"#.into()),
        );
        let before = bridge.buffer().len();
        deliver(&mut bridge, SocketEventKind::Message("{not json".into()));
        deliver(
            &mut bridge,
            SocketEventKind::Message(r#"{"type":"mystery","data":"x"}"#.into()),
        );
        assert_eq!(bridge.buffer().len(), before);

        deliver(
            &mut bridge,
            SocketEventKind::Message(r#"{"type":"error","message":"pty hiccup"}"#.into()),
        );

        let kinds: Vec<LineKind> = bridge.buffer().lines().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![LineKind::Banner, LineKind::Output, LineKind::ServerError]
        );
        assert_eq!(bridge.state(), &SessionState::Connected);
    }

    #[test]
    fn test_clear_keeps_session() {
        let (mut bridge, connector) = connected("gpu-a");
        deliver(
            &mut bridge,
            SocketEventKind::Message(r#"{"type":"output","data":"hello\n"}"#.into()),
        );
        bridge.clear();
        assert!(bridge.buffer().is_empty());
        assert_eq!(bridge.state(), &SessionState::Connected);
        assert_eq!(connector.live_count(), 1);
    }

    #[test]
    fn test_teardown_closes_socket() {
        let (mut bridge, connector) = connected("gpu-a");
        bridge.teardown();
        assert_eq!(bridge.state(), &SessionState::Idle);
        assert!(connector.is_closed(0));
        assert_eq!(bridge.target(), None);

        bridge.teardown();
        assert_eq!(bridge.state(), &SessionState::Idle);
    }

    #[test]
    fn test_transport_failure_is_error_state() {
        let (mut bridge, _connector) = bridge();
        let list = servers();
        bridge.connect("gpu-a", Some(&list)).unwrap();
        deliver(
            &mut bridge,
            SocketEventKind::Failed("connection refused".to_string()),
        );
        assert_eq!(
            bridge.state(),
            &SessionState::Error {
                code: None,
                detail: "connection refused".to_string()
            }
        );
    }
}
