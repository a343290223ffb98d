//! # yak-core: protocol types and traits for Wild Yak
//!
//! This crate defines the data that crosses the engine boundary and the
//! two collaborator interfaces a host plugs into the engine.
//!
//! ## The Boundary
//!
//! | Concern | Types | What it does |
//! |---------|-------|-------------|
//! | Messages | [`InboundMessage`], [`OutboundMessage`] | Normalized channel-independent messages |
//! | Persisted state | [`SerializableStack`], [`SerializableFrame`] | The only form of a conversation that leaves the process |
//! | Store | [`ConversationStore`] | Where serialized stacks live between turns |
//! | Formatter | [`MessageFormatter`] | Channel payloads in, channel payloads out |
//!
//! ## Design Principle
//!
//! Nothing here knows about topics, closures or the registry. A stored
//! conversation is plain JSON with topic and callback identity reduced to
//! names; resolving those names back to live objects is the engine's job.
//! That keeps stores and formatters swappable without touching dialog code.
//!
//! ## Dependency Notes
//!
//! Frame data, init arguments and user data are `serde_json::Value`. They
//! must survive a round trip through an arbitrary store, so JSON is the
//! lowest common denominator.

#![deny(missing_docs)]

pub mod duration;
pub mod error;
pub mod format;
pub mod id;
pub mod message;
pub mod snapshot;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use duration::DurationMs;
pub use error::{FormatError, StoreError, TopicError};
pub use format::{ExternalMessage, MessageFormatter};
pub use id::{CallbackName, ConversationId, TopicName};
pub use message::{Attachment, InboundMessage, OutboundMessage};
pub use snapshot::{SerializableFrame, SerializableStack};
pub use store::ConversationStore;
