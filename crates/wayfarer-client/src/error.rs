// ABOUTME: Error types for wayfarer-client
// ABOUTME: Connection, URL, send, and frame encoding failures

use thiserror::Error;

/// Errors that can occur in wayfarer-client operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Frame encoding failed: {0}")]
    Proto(#[from] wayfarer_proto::ProtoError),
}
