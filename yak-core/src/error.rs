//! Error types for each boundary.

use thiserror::Error;

/// Dialog errors: composition mistakes, protocol violations and
/// anything a topic's own code reports.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TopicError {
    /// enter/exit/clear was called from a context that is not the
    /// top of the stack. This is a bug in the application's topics.
    #[error("illegal topic transition: {0}")]
    IllegalTopicTransition(String),

    /// A topic name could not be resolved through the registry.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// A callback name is not defined on the topic it was looked up on.
    #[error("unknown callback {callback} on topic {topic}")]
    UnknownCallback {
        /// Topic whose callbacks were searched.
        topic: String,
        /// Callback name that was not found.
        callback: String,
    },

    /// The state handle refers to a frame that is no longer on the stack.
    #[error("context is no longer on the stack")]
    StaleContext,

    /// The registry failed validation at build time.
    #[error("invalid registry: {0}")]
    InvalidRegistry(String),

    /// Serialized state is structurally inconsistent.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A regex condition pattern failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// Frame data or arguments did not have the expected shape.
    #[error("data error: {0}")]
    Data(#[from] serde_json::Error),

    /// Catch-all for errors raised by predicates, handlers and callbacks.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TopicError {
    /// Wrap any error raised inside topic code.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        TopicError::Other(err.into())
    }
}

/// Conversation store errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading from the backend failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// A write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Message formatter errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FormatError {
    /// The raw payload is not a message this formatter understands.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// A batch merge was requested with no messages.
    #[error("no messages to merge")]
    Empty,

    /// The outbound message has no representation on this channel.
    #[error("unsupported message: {0}")]
    Unsupported(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
