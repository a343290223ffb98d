//! The handler surface: one inbound message in, new state and output out.

use crate::config::EngineConfig;
use crate::registry::TopicRegistry;
use crate::serialize;
use crate::state::Conversation;
use crate::topic::Topic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use yak_core::{InboundMessage, OutboundMessage, SerializableStack, TopicError};

/// The result of handling one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerResponse {
    /// State to pass back on the conversation's next message.
    pub state: SerializableStack,
    /// Messages to send to the user, in order. Empty when nothing matched.
    pub output: Vec<OutboundMessage>,
}

/// A dialog engine over a fixed set of topics.
///
/// The engine holds no per-conversation state: every call rebuilds the
/// stack from the serialized state it is given, so one engine serves any
/// number of conversations. Cloning shares the registry.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<TopicRegistry>,
}

impl Engine {
    /// Build an engine over `topics` with the default configuration.
    pub fn new(topics: impl IntoIterator<Item = Topic>) -> Result<Self, TopicError> {
        Ok(Self::from_registry(TopicRegistry::new(topics)?))
    }

    /// Build an engine over `topics` with an explicit configuration.
    pub fn with_config(
        topics: impl IntoIterator<Item = Topic>,
        config: EngineConfig,
    ) -> Result<Self, TopicError> {
        Ok(Self::from_registry(TopicRegistry::with_config(topics, config)?))
    }

    /// Wrap an already validated registry.
    pub fn from_registry(registry: TopicRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// The engine's topics.
    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    /// Rehydrate a conversation without dispatching anything.
    ///
    /// A missing state is a fresh virgin conversation. Missing user data
    /// is `null`.
    pub fn load(
        &self,
        state: Option<SerializableStack>,
        user_data: Option<Value>,
    ) -> Result<Conversation, TopicError> {
        let stack = serialize::from_serializable(state.unwrap_or_default(), &self.registry)?;
        Ok(Conversation::new(
            Arc::clone(&self.registry),
            stack,
            user_data.unwrap_or(Value::Null),
        ))
    }

    /// Handle one message.
    ///
    /// Rehydrates `state`, enters the main topic on a virgin conversation,
    /// dispatches `input` and returns the re-serialized stack with the
    /// output. Any error from topic code aborts the turn; the caller should
    /// keep its previous state in that case.
    pub async fn handle(
        &self,
        input: InboundMessage,
        state: Option<SerializableStack>,
        user_data: Option<Value>,
    ) -> Result<HandlerResponse, TopicError> {
        let span = tracing::debug_span!(
            "yak.dispatch",
            frames = state.as_ref().map_or(0, SerializableStack::len)
        );
        async move {
            let conversation = self.load(state, user_data)?;
            conversation.start().await?;
            let output = conversation.dispatch(input).await?;
            Ok(HandlerResponse {
                state: conversation.to_serializable()?,
                output,
            })
        }
        .instrument(span)
        .await
    }
}
