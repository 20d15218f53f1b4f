//! Socket seam between the bridge and the transport.
//!
//! A connector spawns one task per session. The task owns the websocket and
//! talks to the bridge only through channels: outbound messages arrive on a
//! [`SocketHandle`], and everything the transport reports is posted back to the
//! event loop as a [`SocketEvent`] tagged with the session it belongs to.

use std::borrow::Cow;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

/// Messages the bridge asks the socket task to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    /// Close with normal closure and end the task
    Close,
}

/// What the transport reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEventKind {
    Opened,
    Message(String),
    Closed { code: Option<u16>, reason: String },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEvent {
    /// Session sequence number the socket was opened for
    pub session: u64,
    pub kind: SocketEventKind,
}

/// Bridge-side end of a live socket.
#[derive(Debug)]
pub struct SocketHandle {
    outbound: UnboundedSender<Outbound>,
}

impl SocketHandle {
    pub fn new(outbound: UnboundedSender<Outbound>) -> Self {
        Self { outbound }
    }

    /// Queue a text frame. Returns false if the socket task is gone.
    pub fn send_text(&self, text: String) -> bool {
        self.outbound.send(Outbound::Text(text)).is_ok()
    }

    /// Ask the task to close with normal closure
    pub fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

/// Opens sockets for the bridge.
pub trait Connector: Send + Sync {
    /// Start connecting to `url`; progress arrives on `events` tagged with `session`.
    fn open(&self, url: Url, session: u64, events: UnboundedSender<SocketEvent>) -> SocketHandle;
}

/// Production connector backed by tokio-tungstenite.
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, url: Url, session: u64, events: UnboundedSender<SocketEvent>) -> SocketHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(url, session, rx, events));
        SocketHandle::new(tx)
    }
}

async fn run_socket(
    url: Url,
    session: u64,
    mut outbound: UnboundedReceiver<Outbound>,
    events: UnboundedSender<SocketEvent>,
) {
    let post = |kind: SocketEventKind| {
        let _ = events.send(SocketEvent { session, kind });
    };

    let ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            warn!(event = "terminal.socket.connect_failed", session, url = %url, error = %e);
            post(SocketEventKind::Failed(e.to_string()));
            return;
        }
    };
    info!(event = "terminal.socket.opened", session, url = %url);
    post(SocketEventKind::Opened);

    let (mut ws_tx, mut ws_rx) = ws.split();
    loop {
        tokio::select! {
            biased;

            out = outbound.recv() => match out {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                        warn!(event = "terminal.socket.send_failed", session, error = %e);
                        post(SocketEventKind::Failed(e.to_string()));
                        return;
                    }
                }
                // Our own close: the bridge already moved on, nothing to report
                Some(Outbound::Close) | None => {
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: Cow::Borrowed(""),
                    };
                    let _ = ws_tx.send(Message::Close(Some(frame))).await;
                    let _ = ws_tx.close().await;
                    debug!(event = "terminal.socket.closed_by_client", session);
                    return;
                }
            },

            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    post(SocketEventKind::Message(text.to_string()));
                }
                Some(Ok(Message::Binary(bytes))) => {
                    post(SocketEventKind::Message(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(f) => (Some(u16::from(f.code)), f.reason.to_string()),
                        None => (None, String::new()),
                    };
                    info!(event = "terminal.socket.closed_by_peer", session, code, reason = %reason);
                    post(SocketEventKind::Closed { code, reason });
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(event = "terminal.socket.read_failed", session, error = %e);
                    post(SocketEventKind::Failed(e.to_string()));
                    return;
                }
                None => {
                    post(SocketEventKind::Closed { code: None, reason: String::new() });
                    return;
                }
            },
        }
    }
}
