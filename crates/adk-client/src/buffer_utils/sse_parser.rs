use std::time::Duration;

use futures::Stream;

use super::buffering::CircularLineBuffer;
use crate::config::DEFAULT_AGENT_AUTHORS;
use crate::error::{ClientError, Result};
use crate::streaming::{next_chunk, Envelope, EventPayload};

/// Prefix of the only SSE lines that carry a payload
pub const DATA_PREFIX: &str = "data: ";

/// Outcome of feeding one chunk or line to the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Keep reading
    Pending,
    /// A completion marker was seen; nothing after it is processed
    Complete { session_id: String },
}

/// Incremental decoder for the agent server's `run_sse` response body.
///
/// Owned by a single streaming call. Chunks go in through [`feed`], the
/// latest full reply text comes out through the sink after every
/// qualifying frame.
///
/// [`feed`]: StreamingEventDecoder::feed
pub struct StreamingEventDecoder {
    buffer: CircularLineBuffer,
    full_response: String,
    agent_authors: Vec<String>,
    completed: Option<String>,
}

impl Default for StreamingEventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingEventDecoder {
    pub fn new() -> Self {
        Self::with_agent_authors(DEFAULT_AGENT_AUTHORS.iter().map(|a| a.to_string()))
    }

    /// Decoder that only accepts frames authored by `authors`
    pub fn with_agent_authors<I, A>(authors: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            buffer: CircularLineBuffer::with_capacity(4096),
            full_response: String::new(),
            agent_authors: authors.into_iter().map(Into::into).collect(),
            completed: None,
        }
    }

    /// Text accumulated so far
    pub fn full_response(&self) -> &str {
        &self.full_response
    }

    /// Bytes held back waiting for a newline
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Append a chunk and process every line it completes
    pub fn feed<F>(&mut self, chunk: &[u8], on_snapshot: &mut F) -> Decoded
    where
        F: FnMut(&str),
    {
        if let Some(session_id) = &self.completed {
            return Decoded::Complete {
                session_id: session_id.clone(),
            };
        }

        self.buffer.extend(chunk);

        while let Some(line) = self.buffer.next_line() {
            let decoded = self.process_line(&line, on_snapshot);
            if decoded != Decoded::Pending {
                return decoded;
            }
        }

        Decoded::Pending
    }

    /// Handle one complete line
    fn process_line<F>(&mut self, line: &str, on_snapshot: &mut F) -> Decoded
    where
        F: FnMut(&str),
    {
        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            return Decoded::Pending;
        };

        let payload = match EventPayload::parse(data) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to parse SSE data: {}", e);
                return Decoded::Pending;
            }
        };

        for envelope in payload.envelopes() {
            match envelope {
                Envelope::Direct {
                    author,
                    partial,
                    texts,
                } => {
                    if partial || !self.is_agent(author) {
                        continue;
                    }
                    // Final events repeat the whole turn, so the last part wins
                    for text in texts {
                        self.full_response.clear();
                        self.full_response.push_str(text);
                        on_snapshot(&self.full_response);
                    }
                }
                Envelope::Wrapped { author, texts } => {
                    if !self.is_agent(author) {
                        continue;
                    }
                    for text in texts {
                        self.full_response.push_str(text);
                        on_snapshot(&self.full_response);
                    }
                }
            }
        }

        if let Some(session_id) = payload.completion() {
            tracing::debug!(%session_id, "Completion marker received");
            self.completed = Some(session_id.clone());
            return Decoded::Complete { session_id };
        }

        Decoded::Pending
    }

    /// End of stream: drop any unterminated line and return the final text
    pub fn finish(mut self) -> String {
        let dropped = self.buffer.discard_partial();
        if dropped > 0 {
            tracing::debug!(bytes = dropped, "Discarding unterminated trailing line");
        }
        self.full_response
    }

    fn is_agent(&self, author: Option<&str>) -> bool {
        author.is_some_and(|a| self.agent_authors.iter().any(|known| known == a))
    }
}

/// Drive `decoder` over a byte stream, calling `on_snapshot` for every
/// snapshot. Returns the last snapshot once the stream ends or a completion
/// marker arrives; chunks after the marker are never read.
pub async fn decode_stream<S, B, E, F>(
    stream: S,
    mut decoder: StreamingEventDecoder,
    idle_timeout: Option<Duration>,
    mut on_snapshot: F,
) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ClientError>,
    F: FnMut(&str),
{
    let mut byte_chunks = Box::pin(stream);

    while let Some(chunk_result) = next_chunk(&mut byte_chunks, idle_timeout).await? {
        let bytes = chunk_result.map_err(Into::into)?;

        if let Decoded::Complete { session_id } = decoder.feed(bytes.as_ref(), &mut on_snapshot) {
            tracing::debug!(%session_id, "Stream completed by marker");
            break;
        }
    }

    Ok(decoder.finish())
}
