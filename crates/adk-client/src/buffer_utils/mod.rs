mod buffering;
mod sse_parser;

pub use buffering::CircularLineBuffer;
pub use sse_parser::{decode_stream, Decoded, StreamingEventDecoder, DATA_PREFIX};
