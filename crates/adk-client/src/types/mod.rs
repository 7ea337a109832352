pub mod content;
pub mod session;

pub use content::{Content, Part};
pub use session::{extract_agent_response, AdkEvent, RunRequest, Session};
