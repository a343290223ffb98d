#![deny(missing_docs)]
//! # wildyak: umbrella crate
//!
//! Single import surface for Wild Yak. Re-exports the protocol, the
//! engine and the optional collaborator crates behind feature flags, plus
//! a `prelude` for composing topics.

#[cfg(feature = "core")]
pub use yak_core;
#[cfg(feature = "core")]
pub use yak_engine;
#[cfg(feature = "format")]
pub use yak_format;
#[cfg(feature = "store-fs")]
pub use yak_store_fs;
#[cfg(feature = "store-memory")]
pub use yak_store_memory;

/// Happy-path imports for defining topics and running conversations.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use yak_core::{
        Attachment, ConversationId, ConversationStore, InboundMessage, MessageFormatter,
        OutboundMessage, SerializableStack, TopicError,
    };

    #[cfg(feature = "core")]
    pub use yak_engine::{
        Condition, ConversationRunner, Engine, EngineConfig, EnterTopic, HandlerResponse,
        RegexMatch, Reply, RunnerConfig, Topic, TopicState,
    };

    #[cfg(feature = "format")]
    pub use yak_format::{MessengerFormatter, WebFormatter};

    #[cfg(feature = "store-memory")]
    pub use yak_store_memory::MemoryStore;

    #[cfg(feature = "store-fs")]
    pub use yak_store_fs::FsStore;
}
