//! Error types for the gridfall library

use thiserror::Error;

/// Result type alias for engine and session operations
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors that can halt a game session
#[derive(Debug, Error)]
pub enum GameError {
    /// A piece was drawn from an empty server queue.
    ///
    /// Requests and draws are paired one to one, so this means the session's
    /// ordering broke upstream. It is never a recoverable game event.
    #[error("Piece queue underflow: drew from an empty queue")]
    QueueUnderflow,

    /// The multiplayer session was started before the queue was filled
    #[error("Session not ready: {queued} of {required} pieces queued")]
    NotReady { queued: usize, required: usize },

    /// Connection to the server went away
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// A player command could not be understood
    #[error("Invalid command: {0:?}")]
    InvalidCommand(String),

    /// Settings could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),

    /// Wire protocol violation
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while decoding server messages or frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Empty message")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid piece identifier: {0:?}")]
    InvalidPiece(String),

    #[error("Malformed record: {0:?}")]
    MalformedRecord(String),

    #[error("Frame of {0} bytes exceeds limit")]
    FrameTooLarge(usize),

    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,
}
