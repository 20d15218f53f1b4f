//! In-memory connector for bridge and lifecycle tests.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use url::Url;

use super::frame::ClientFrame;
use super::socket::{Connector, Outbound, SocketEvent, SocketHandle};

struct FakeSocket {
    url: Url,
    session: u64,
    rx: UnboundedReceiver<Outbound>,
    sent: Vec<Outbound>,
    dropped: bool,
}

impl FakeSocket {
    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(out) => self.sent.push(out),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.dropped = true;
                    break;
                }
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.dropped || self.sent.contains(&Outbound::Close)
    }
}

/// Records every socket the bridge opens; nothing touches the network.
#[derive(Clone, Default)]
pub struct FakeConnector {
    sockets: Arc<Mutex<Vec<FakeSocket>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(url, session)` of every socket opened so far, oldest first
    pub fn opened(&self) -> Vec<(Url, u64)> {
        self.sockets
            .lock()
            .unwrap()
            .iter()
            .map(|s| (s.url.clone(), s.session))
            .collect()
    }

    /// Everything sent on the `index`th socket
    pub fn sent(&self, index: usize) -> Vec<Outbound> {
        let mut sockets = self.sockets.lock().unwrap();
        let socket = &mut sockets[index];
        socket.drain();
        socket.sent.clone()
    }

    /// Text frames sent on the `index`th socket, decoded
    pub fn frames(&self, index: usize) -> Vec<ClientFrame> {
        self.sent(index)
            .into_iter()
            .filter_map(|out| match out {
                Outbound::Text(text) => serde_json::from_str(&text).ok(),
                Outbound::Close => None,
            })
            .collect()
    }

    pub fn is_closed(&self, index: usize) -> bool {
        let mut sockets = self.sockets.lock().unwrap();
        let socket = &mut sockets[index];
        socket.drain();
        socket.is_closed()
    }

    /// Sockets that were opened and not yet closed
    pub fn live_count(&self) -> usize {
        let mut sockets = self.sockets.lock().unwrap();
        for socket in sockets.iter_mut() {
            socket.drain();
        }
        sockets.iter().filter(|s| !s.is_closed()).count()
    }
}

impl Connector for FakeConnector {
    fn open(&self, url: Url, session: u64, _events: UnboundedSender<SocketEvent>) -> SocketHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sockets.lock().unwrap().push(FakeSocket {
            url,
            session,
            rx,
            sent: Vec::new(),
            dropped: false,
        });
        SocketHandle::new(tx)
    }
}
