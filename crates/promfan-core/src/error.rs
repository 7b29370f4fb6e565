//! Shared error type across promfan crates.

use thiserror::Error;

/// Stable failure classes, used as a structured field in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Invalid configuration.
    Config,
    /// Upstream body is not valid exposition text.
    Decode,
    /// A family could not be rendered.
    Encode,
    /// Connect / read failure talking to a target.
    Transport,
    /// Target answered with a non-success status.
    Status,
    /// Target did not answer within the per-target deadline.
    Timeout,
    /// Anything else.
    Internal,
}

impl FailureKind {
    /// String representation used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Config => "config",
            FailureKind::Decode => "decode",
            FailureKind::Encode => "encode",
            FailureKind::Transport => "transport",
            FailureKind::Status => "status",
            FailureKind::Timeout => "timeout",
            FailureKind::Internal => "internal",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PromfanError>;

/// Unified error type used by core and proxy.
#[derive(Debug, Error)]
pub enum PromfanError {
    #[error("config: {0}")]
    Config(String),
    #[error("decode failed at line {line}: {msg}")]
    Decode { line: usize, msg: String },
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("timed out after {0}ms")]
    Timeout(u64),
    #[error("internal: {0}")]
    Internal(String),
}

impl PromfanError {
    /// Map the error to its stable failure class.
    pub fn kind(&self) -> FailureKind {
        match self {
            PromfanError::Config(_) => FailureKind::Config,
            PromfanError::Decode { .. } => FailureKind::Decode,
            PromfanError::Encode(_) => FailureKind::Encode,
            PromfanError::Transport(_) => FailureKind::Transport,
            PromfanError::Status(_) => FailureKind::Status,
            PromfanError::Timeout(_) => FailureKind::Timeout,
            PromfanError::Internal(_) => FailureKind::Internal,
        }
    }

    pub(crate) fn decode(line: usize, msg: impl Into<String>) -> Self {
        PromfanError::Decode { line, msg: msg.into() }
    }
}
