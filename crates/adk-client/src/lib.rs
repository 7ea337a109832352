pub mod types;
pub mod traits;
pub mod config;
pub mod error;
pub mod streaming;
pub mod buffer_utils;
pub mod client;

pub use traits::{AgentClient, SnapshotSink};

pub use buffer_utils::{decode_stream, CircularLineBuffer, Decoded, StreamingEventDecoder};
pub use client::AdkClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use streaming::{snapshot_stream, Envelope, EventPayload, StreamEvent};
pub use types::{extract_agent_response, AdkEvent, Content, Part, RunRequest, Session};
