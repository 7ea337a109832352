use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Agent server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No data received for {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the failure came from the connection or the server rather than local input
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::Status { .. } | ClientError::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
