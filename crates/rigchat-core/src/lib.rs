pub mod client;
pub mod config;
pub mod error;
pub mod mode;
pub mod request;
pub mod session;
pub mod state;
pub mod stream;

// Re-export main types for convenience
pub use client::{ByteStream, ChatClient, Transport};
pub use config::Config;
pub use error::{ChatError, Result};
pub use mode::Mode;
pub use request::{ChatRequest, RequestContext};
pub use session::{ChatSession, SessionStatus};
pub use state::{ChatMessage, ChatRole, Transcript};
pub use stream::{FrameRecovery, StreamProcessor, StreamStatus};
