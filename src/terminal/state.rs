//! Session state machine for the terminal bridge.
//!
//! Every socket callback, user action and teardown is expressed as a
//! [`SessionEvent`] and folded through [`SessionState::transition`].

use std::fmt;

/// Close code: target server is not configured
pub const CLOSE_UNKNOWN_SERVER: u16 = 4000;
/// Close code: target server is administratively disabled
pub const CLOSE_SERVER_DISABLED: u16 = 4001;
/// Close code: the server failed to open the remote shell
pub const CLOSE_CONNECTION_ERROR: u16 = 4002;

/// Why a session ended by our own hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The operator asked to disconnect
    User,
    /// A new connect replaced this session
    Replaced,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::User => write!(f, "user"),
            DisconnectReason::Replaced => write!(f, "replaced"),
        }
    }
}

/// Lifecycle state of the single terminal session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected(DisconnectReason),
    /// The transport closed or failed without us asking
    Error { code: Option<u16>, detail: String },
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A connection attempt started
    Connect,
    /// The transport reported open
    Opened,
    /// The transport closed, with the peer's close code if any
    Closed { code: Option<u16>, detail: String },
    /// The transport could not be established or broke
    Failed(String),
    /// We closed the session
    Disconnect(DisconnectReason),
    /// The host is going away
    Teardown,
}

impl SessionState {
    /// Compute the state that follows `event`.
    pub fn transition(&self, event: &SessionEvent) -> SessionState {
        use SessionEvent as E;
        use SessionState as S;

        match (self, event) {
            (_, E::Teardown) => S::Idle,
            (_, E::Connect) => S::Connecting,
            (S::Connecting, E::Opened) => S::Connected,
            (S::Connecting | S::Connected, E::Closed { code, detail }) => S::Error {
                code: *code,
                detail: detail.clone(),
            },
            (S::Connecting | S::Connected, E::Failed(detail)) => S::Error {
                code: None,
                detail: detail.clone(),
            },
            (S::Connecting | S::Connected, E::Disconnect(reason)) => S::Disconnected(*reason),
            // Everything else leaves the state alone
            (state, _) => state.clone(),
        }
    }

    /// Connecting or connected: a socket is owned
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Connected)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected)
    }

    /// Short label for the pane title
    pub fn label(&self) -> String {
        match self {
            SessionState::Idle => "idle".to_string(),
            SessionState::Connecting => "connecting".to_string(),
            SessionState::Connected => "connected".to_string(),
            SessionState::Disconnected(reason) => format!("disconnected ({reason})"),
            SessionState::Error { code: Some(code), .. } => format!("error {code}"),
            SessionState::Error { code: None, .. } => "error".to_string(),
        }
    }
}

/// Operator-facing reason derived from a close code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    NotConfigured,
    Disabled,
    ServerError(String),
    Lost,
}

impl CloseReason {
    pub fn from_close(code: Option<u16>, detail: &str) -> Self {
        match code {
            Some(CLOSE_UNKNOWN_SERVER) => CloseReason::NotConfigured,
            Some(CLOSE_SERVER_DISABLED) => CloseReason::Disabled,
            Some(CLOSE_CONNECTION_ERROR) => CloseReason::ServerError(detail.to_string()),
            _ => CloseReason::Lost,
        }
    }

    /// Termination notice written into the buffer
    pub fn notice(&self) -> String {
        match self {
            CloseReason::NotConfigured => {
                "Connection closed: target server is not configured".to_string()
            }
            CloseReason::Disabled => "Connection closed: target server is disabled".to_string(),
            CloseReason::ServerError(detail) if detail.is_empty() => {
                "Connection closed: server-side connection error".to_string()
            }
            CloseReason::ServerError(detail) => {
                format!("Connection closed: server-side connection error: {detail}")
            }
            CloseReason::Lost => "Connection lost".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed(code: Option<u16>) -> SessionEvent {
        SessionEvent::Closed {
            code,
            detail: "bye".to_string(),
        }
    }

    fn error(code: Option<u16>, detail: &str) -> SessionState {
        SessionState::Error {
            code,
            detail: detail.to_string(),
        }
    }

    #[test]
    fn test_transition_table() {
        use DisconnectReason::*;
        use SessionEvent as E;
        use SessionState as S;

        let cases = vec![
            (S::Idle, E::Connect, S::Connecting),
            (S::Idle, E::Opened, S::Idle),
            (S::Idle, E::Disconnect(User), S::Idle),
            (S::Idle, closed(Some(4000)), S::Idle),
            (S::Connecting, E::Opened, S::Connected),
            (S::Connecting, closed(Some(4000)), error(Some(4000), "bye")),
            (S::Connecting, E::Failed("refused".into()), error(None, "refused")),
            (S::Connecting, E::Disconnect(Replaced), S::Disconnected(Replaced)),
            (S::Connected, E::Opened, S::Connected),
            (S::Connected, closed(None), error(None, "bye")),
            (S::Connected, E::Disconnect(User), S::Disconnected(User)),
            (S::Connected, E::Teardown, S::Idle),
            (S::Disconnected(User), E::Disconnect(User), S::Disconnected(User)),
            (S::Disconnected(User), closed(Some(1000)), S::Disconnected(User)),
            (S::Disconnected(User), E::Connect, S::Connecting),
            (error(Some(4002), "x"), E::Disconnect(User), error(Some(4002), "x")),
            (error(Some(4002), "x"), E::Connect, S::Connecting),
            (error(Some(4002), "x"), E::Teardown, S::Idle),
        ];

        for (from, event, expected) in cases {
            assert_eq!(
                from.transition(&event),
                expected,
                "{from:?} --{event:?}-->"
            );
        }
    }

    #[test]
    fn test_close_codes_map_to_distinct_notices() {
        let not_configured = CloseReason::from_close(Some(4000), "");
        let disabled = CloseReason::from_close(Some(4001), "");
        let server_error = CloseReason::from_close(Some(4002), "ssh refused");
        let lost = CloseReason::from_close(Some(1006), "");

        assert_eq!(disabled, CloseReason::Disabled);
        assert_ne!(disabled.notice(), not_configured.notice());
        assert_ne!(disabled.notice(), server_error.notice());
        assert!(server_error.notice().ends_with("ssh refused"));
        assert_eq!(lost.notice(), "Connection lost");
        assert_eq!(CloseReason::from_close(None, ""), CloseReason::Lost);
    }

    #[test]
    fn test_labels() {
        assert_eq!(SessionState::Idle.label(), "idle");
        assert_eq!(error(Some(4001), "").label(), "error 4001");
        assert_eq!(
            SessionState::Disconnected(DisconnectReason::User).label(),
            "disconnected (user)"
        );
    }
}
