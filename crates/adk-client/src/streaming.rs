use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::buffer_utils::{Decoded, StreamingEventDecoder};
use crate::error::{ClientError, Result};

/// What a streaming call reports to its consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Latest known full text of the agent's reply
    Snapshot {
        text: String,
    },

    /// Stream finished; `session_id` is set when the server sent a completion marker
    Done {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
}

/// JSON payload of one `data: ` line.
///
/// The server speaks two envelope shapes and may add a completion marker.
/// Fields are read with JS-style truthiness, so a field of an unexpected
/// type only disables the shape it belongs to.
#[derive(Debug, Clone, Default)]
pub struct EventPayload {
    value: Value,
}

/// One recognised envelope inside a payload.
///
/// `Direct` carries an authoritative snapshot (replaces the accumulated
/// text), `Wrapped` carries an increment (appended to it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<'a> {
    Direct {
        author: Option<&'a str>,
        partial: bool,
        texts: Vec<&'a str>,
    },
    Wrapped {
        author: Option<&'a str>,
        texts: Vec<&'a str>,
    },
}

/// `null`, `false`, `0`, and `""` are falsy; everything else is truthy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Non-empty text parts of `holder.content.parts`, or `None` when that path
/// is missing or `parts` is not an array
fn content_texts(holder: &Value) -> Option<Vec<&str>> {
    let parts = holder.get("content")?.get("parts")?.as_array()?;
    Some(
        parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .filter(|t| !t.is_empty())
            .collect(),
    )
}

impl EventPayload {
    pub fn parse(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data).map(|value| Self { value })
    }

    /// Envelopes present in this payload, direct first
    pub fn envelopes(&self) -> Vec<Envelope<'_>> {
        let mut envelopes = Vec::with_capacity(2);

        if let Some(texts) = content_texts(&self.value) {
            envelopes.push(Envelope::Direct {
                author: self.value.get("author").and_then(Value::as_str),
                partial: self.value.get("partial").is_some_and(is_truthy),
                texts,
            });
        }

        if let Some(event) = self.value.get("event") {
            if let Some(texts) = content_texts(event) {
                envelopes.push(Envelope::Wrapped {
                    author: event.get("author").and_then(Value::as_str),
                    texts,
                });
            }
        }

        envelopes
    }

    /// Session id of a completion marker, if this payload is one.
    ///
    /// Any truthy `sessionId` counts; non-string ids are rendered as JSON.
    pub fn completion(&self) -> Option<String> {
        match self.value.get("sessionId")? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            other if is_truthy(other) => Some(other.to_string()),
            _ => None,
        }
    }
}

/// Wait for the next chunk, giving up after `idle_timeout` when one is set
pub(crate) async fn next_chunk<S>(
    chunks: &mut S,
    idle_timeout: Option<Duration>,
) -> Result<Option<S::Item>>
where
    S: Stream + Unpin,
{
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, chunks.next())
            .await
            .map_err(|_| ClientError::Timeout(limit)),
        None => Ok(chunks.next().await),
    }
}

/// Decode an SSE byte stream into a stream of snapshots.
///
/// Yields `Snapshot` for each qualifying frame and a final `Done`. A
/// transport error or idle timeout is yielded once and ends the stream.
pub fn snapshot_stream<S, B, E>(
    stream: S,
    decoder: StreamingEventDecoder,
    idle_timeout: Option<Duration>,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut decoder = decoder;
        let mut session_id = None;

        loop {
            let chunk_result = match next_chunk(&mut byte_chunks, idle_timeout).await {
                Ok(Some(chunk_result)) => chunk_result,
                Ok(None) => break,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            match chunk_result {
                Ok(bytes) => {
                    let mut snapshots = Vec::new();
                    let decoded = decoder.feed(bytes.as_ref(), &mut |text: &str| {
                        snapshots.push(text.to_string())
                    });

                    for text in snapshots {
                        yield Ok(StreamEvent::Snapshot { text });
                    }

                    if let Decoded::Complete { session_id: id } = decoded {
                        session_id = Some(id);
                        break;
                    }
                }
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            }
        }

        yield Ok(StreamEvent::Done {
            text: decoder.finish(),
            session_id,
        });
    })
}
