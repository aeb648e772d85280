//! Crate-wide error type.

use std::fmt;

/// Failure kinds surfaced by the codec, the wire protocol, child process
/// management, and map parsing.
#[derive(Debug)]
pub enum ArenaError {
    /// A `:` was found before any length digits were read.
    EmptyLength,
    /// The length prefix was not a canonical decimal integer.
    BadLength { found: String },
    /// The stream ended before a full message could be read.
    Truncated,
    /// The payload bytes were not valid JSON.
    BadJson { detail: String },
    /// A child's handshake message was missing or malformed.
    BadHandshake { detail: String },
    /// A child's `ready` field was missing or did not match its punter id.
    BadReady { detail: String },
    /// A child's move message was neither a well-formed claim nor a pass.
    BadMove { detail: String },
    /// The child process could not be launched.
    ChildSpawnFailed { detail: String },
    /// The map file violated the expected schema.
    MapSchema { detail: String },
    /// Wraps an underlying I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLength => write!(f, "empty length prefix before ':'"),
            Self::BadLength { found } => write!(f, "bad length prefix: {found:?}"),
            Self::Truncated => write!(f, "stream truncated before message completed"),
            Self::BadJson { detail } => write!(f, "invalid json payload: {detail}"),
            Self::BadHandshake { detail } => write!(f, "bad handshake: {detail}"),
            Self::BadReady { detail } => write!(f, "bad ready: {detail}"),
            Self::BadMove { detail } => write!(f, "bad move: {detail}"),
            Self::ChildSpawnFailed { detail } => write!(f, "child spawn failed: {detail}"),
            Self::MapSchema { detail } => write!(f, "map schema violation: {detail}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for ArenaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ArenaError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, ArenaError>;
