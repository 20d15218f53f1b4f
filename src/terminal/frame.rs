//! JSON frames exchanged over the terminal socket.
//!
//! Every frame is an object with a `type` discriminator.

use serde::{Deserialize, Serialize};

/// Frames sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Keystrokes for the remote shell's stdin
    Input { data: String },
    /// Remote pseudo-terminal geometry
    Resize { cols: u16, rows: u16 },
}

/// Frames received from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// Shell stdout/stderr
    Output { data: String },
    /// Greeting once the remote shell is live
    Connected { message: String },
    /// Non-fatal server-side error
    Error { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ClientFrame {
    pub fn encode(&self) -> String {
        // Serializing these variants cannot fail: no maps with non-string keys
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl ServerFrame {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }
}
