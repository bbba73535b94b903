use thiserror::Error;

/// Errors surfaced by a chat send.
///
/// Frame-level JSON failures never show up here unless bounded recovery is
/// configured; they are handled inside the stream processor.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyInput,

    #[error("a reply is already streaming")]
    Busy,

    #[error("completion backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion backend returned no body")]
    EmptyBody,

    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("frame could not be parsed after {attempts} attempts: {line}")]
    MalformedFrame { line: String, attempts: u32 },

    #[error("stream cancelled")]
    Cancelled,

    #[error("failed to encode request: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
