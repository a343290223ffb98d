#![deny(missing_docs)]
//! Stack-based dialog engine for Wild Yak.
//!
//! Conversations are modelled as a stack of topic frames. Each inbound
//! message is offered first to the conditions of the topic on top of the
//! stack, then to the global topic's conditions, and the single handler
//! that matches may enter, exit or clear topics as a side effect.
//!
//! ```no_run
//! use yak_engine::{Condition, Engine, Reply, Topic};
//! use yak_core::InboundMessage;
//!
//! # async fn demo() -> Result<(), yak_core::TopicError> {
//! let engine = Engine::new([
//!     Topic::builder("global").build(),
//!     Topic::builder("main")
//!         .root()
//!         .condition(Condition::regex("hello", &["(?i)^hello"], |_state, _m| async {
//!             Ok(Reply::from("hey, what's up!"))
//!         })?)
//!         .build(),
//! ])?;
//!
//! let first = engine.handle(InboundMessage::text("hello world"), None, None).await?;
//! let _second = engine
//!     .handle(InboundMessage::text("bye"), Some(first.state), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! State between turns is a [`SerializableStack`](yak_core::SerializableStack);
//! the engine never stores it. [`ConversationRunner`] wires the engine to a
//! [`ConversationStore`](yak_core::ConversationStore) and a
//! [`MessageFormatter`](yak_core::MessageFormatter) for hosts that want that.

mod condition;
mod config;
mod dispatch;
mod engine;
mod protocol;
mod registry;
mod reply;
mod runner;
mod serialize;
mod stack;
mod state;
mod topic;

pub use condition::{Condition, RegexMatch, compile_patterns, regex_predicate};
pub use config::{EngineConfig, RunnerConfig};
pub use dispatch::is_eligible;
pub use engine::{Engine, HandlerResponse};
pub use protocol::EnterTopic;
pub use registry::{RegistryBuilder, TopicRegistry};
pub use reply::Reply;
pub use runner::{ConversationRunner, RunnerError};
pub use serialize::{from_serializable, to_serializable};
pub use stack::{Frame, FrameId, Stack};
pub use state::{Conversation, TopicState};
pub use topic::{Callback, CallbackFn, Topic, TopicBuilder};
