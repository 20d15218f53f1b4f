//! Response envelope shared by every data-source endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FetchError;

/// `{success, data, message}` wrapper around each endpoint's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning `success=false` or a missing body into an error.
    pub fn into_data(self) -> Result<T, FetchError> {
        if !self.success {
            return Err(FetchError::Rejected(
                self.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }
        self.data.ok_or(FetchError::MissingData)
    }
}
