use crate::error::Result;
use crate::streaming::StreamEvent;
use crate::types::{AdkEvent, Session};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Sink for reply snapshots; called once per qualifying frame
pub type SnapshotSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Operations a front end needs from an agent server
///
/// Implemented by [`crate::AdkClient`]; front ends hold it as `Arc<dyn AgentClient>`
/// so they can be exercised against a fake.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Fetch the configured session, creating it if the server has none
    async fn create_or_get_session(&self) -> Result<Session>;

    /// Fetch the configured session
    async fn get_session(&self) -> Result<Session>;

    /// Send a user message and stream the reply into `on_snapshot`.
    /// Returns the final reply text.
    async fn send_message(&self, message: &str, on_snapshot: SnapshotSink<'_>) -> Result<String>;

    /// Send a user message and receive the reply as a stream of events
    async fn stream_message(
        &self,
        message: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>>;

    /// Non-streaming run; returns every event the turn produced
    async fn run(&self, message: &str) -> Result<Vec<AdkEvent>>;

    /// Names of the apps the server hosts
    async fn list_apps(&self) -> Result<Vec<String>>;
}
