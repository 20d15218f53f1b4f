//! Terminal session bridge: one interactive remote shell at a time.

pub mod bridge;
pub mod buffer;
pub mod frame;
pub mod resize;
pub mod screen;
pub mod socket;
pub mod state;

#[cfg(test)]
pub(crate) mod fake;

pub use bridge::TerminalBridge;
pub use buffer::{BufferLine, LineKind, OutputBuffer};
pub use frame::{ClientFrame, FrameError, ServerFrame};
pub use resize::{ResizeCoalescer, Viewport};
pub use screen::{CellAttrs, ScreenCell, ScreenRow, ScreenState, TermColor};
pub use socket::{Connector, Outbound, SocketEvent, SocketEventKind, SocketHandle, WsConnector};
pub use state::{CloseReason, DisconnectReason, SessionEvent, SessionState};

/// Why a connect request was refused before any socket was opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("no server selected")]
    NoServerSelected,

    #[error("server list has not loaded yet")]
    ServerListUnavailable,

    #[error("unknown server: {0}")]
    UnknownServer(String),

    #[error("server is disabled: {0}")]
    ServerDisabled(String),

    #[error("cannot build terminal endpoint: {0}")]
    Endpoint(String),
}
