//! Crate-level error types.
//!
//! [`TickwireError`] unifies every error source (configuration, WebSocket,
//! JSON, subscription bookkeeping) behind a single enum so callers can match
//! on the variant they care about while still using the `?` operator for
//! easy propagation.

use crate::models::MessageType;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TickwireError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum TickwireError {
    /// An environment variable held a value that could not be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A frame did not match any known response shape.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A handler is already registered for this message type.
    #[error("a handler is already attached for `{0}`")]
    AlreadyAttached(MessageType),

    /// A request was issued while no connection was open.
    #[error("no open connection")]
    NotConnected,
}
