//! Device gateway error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("Device gateway not configured")]
    NotConfigured,

    #[error("Device gateway configuration error: {0}")]
    Configuration(String),

    #[error("Device gateway request failed: {0}")]
    Request(String),

    #[error("Device gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode device gateway response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Request(err.to_string())
        }
    }
}
