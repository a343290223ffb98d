//! Per-turn conversation state and the handles topic code works through.

use crate::dispatch;
use crate::registry::TopicRegistry;
use crate::serialize;
use crate::stack::{FrameId, Stack};
use crate::topic::Topic;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use yak_core::{InboundMessage, OutboundMessage, SerializableStack, TopicError, TopicName};

pub(crate) struct ConversationInner {
    pub(crate) registry: Arc<TopicRegistry>,
    stack: Mutex<Stack>,
    pub(crate) user_data: Value,
}

impl ConversationInner {
    /// Run `f` with the stack locked. The guard never escapes `f`, so the
    /// lock is never held across an await point.
    pub(crate) fn with_stack<R>(
        &self,
        f: impl FnOnce(&mut Stack) -> Result<R, TopicError>,
    ) -> Result<R, TopicError> {
        let mut stack = self
            .stack
            .lock()
            .map_err(|e| TopicError::other(format!("stack lock poisoned: {e}")))?;
        f(&mut stack)
    }
}

/// The handle a condition, callback or `after_init` hook receives.
///
/// A state is bound to one stack frame (or to no frame, for the global
/// context used while the stack is empty) and records which topic's code
/// is running. It may change the stack only while its frame is on top.
/// Cloning is cheap; all clones share the turn's stack.
#[derive(Clone)]
pub struct TopicState {
    pub(crate) conversation: Arc<ConversationInner>,
    pub(crate) frame: Option<FrameId>,
    pub(crate) owner: Arc<Topic>,
}

impl TopicState {
    pub(crate) fn new(conversation: Arc<ConversationInner>, frame: Option<FrameId>, owner: Arc<Topic>) -> Self {
        Self {
            conversation,
            frame,
            owner,
        }
    }

    /// The frame this state is bound to; `None` for the detached global context.
    pub fn frame_id(&self) -> Option<FrameId> {
        self.frame
    }

    /// The topic whose code holds this state.
    pub fn owner(&self) -> &Arc<Topic> {
        &self.owner
    }

    /// Host-supplied data for this turn.
    pub fn user_data(&self) -> &Value {
        &self.conversation.user_data
    }

    /// The topic registry.
    pub fn registry(&self) -> &TopicRegistry {
        &self.conversation.registry
    }

    /// Whether this state's frame is the top of the stack.
    pub fn is_active(&self) -> Result<bool, TopicError> {
        self.conversation.with_stack(|stack| Ok(stack.is_active(self.frame)))
    }

    /// Current number of frames.
    pub fn stack_len(&self) -> Result<usize, TopicError> {
        self.conversation.with_stack(|stack| Ok(stack.len()))
    }

    /// Name of the topic on top of the stack.
    pub fn active_topic(&self) -> Result<Option<TopicName>, TopicError> {
        self.conversation
            .with_stack(|stack| Ok(stack.top().map(|f| f.topic().name().clone())))
    }

    /// A copy of the bound frame's data.
    pub fn data(&self) -> Result<Value, TopicError> {
        self.conversation.with_stack(|stack| match self.frame {
            Some(id) => stack
                .frame(id)
                .map(|f| f.data().clone())
                .ok_or(TopicError::StaleContext),
            None => Ok(stack.detached_data().clone()),
        })
    }

    /// The bound frame's data, deserialized.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, TopicError> {
        Ok(serde_json::from_value(self.data()?)?)
    }

    /// Replace the bound frame's data.
    ///
    /// Data written through the detached global context lasts for the
    /// current turn only.
    pub fn set_data(&self, data: Value) -> Result<(), TopicError> {
        self.conversation.with_stack(|stack| match self.frame {
            Some(id) => {
                let frame = stack.frame_mut(id).ok_or(TopicError::StaleContext)?;
                frame.data = data;
                Ok(())
            }
            None => {
                stack.set_detached_data(data);
                Ok(())
            }
        })
    }

    /// Modify the bound frame's data.
    ///
    /// `f` runs on a copy with the stack unlocked, so it may call back into
    /// this or any other state. The copy is written back afterwards; if the
    /// frame was popped in the meantime the write fails with
    /// [`TopicError::StaleContext`].
    pub fn update_data(&self, f: impl FnOnce(&mut Value)) -> Result<(), TopicError> {
        let mut data = self.data()?;
        f(&mut data);
        self.set_data(data)
    }

    /// Serialize the whole stack as it stands right now.
    pub fn snapshot(&self) -> Result<SerializableStack, TopicError> {
        self.conversation.with_stack(|stack| Ok(serialize::to_serializable(stack)))
    }
}

impl fmt::Debug for TopicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicState")
            .field("frame", &self.frame)
            .field("owner", self.owner.name())
            .finish()
    }
}

/// One conversation, loaded for one turn.
///
/// Produced by [`Engine::load`](crate::Engine::load). Most hosts call
/// [`Engine::handle`](crate::Engine::handle), which loads, starts,
/// dispatches and serializes in one go.
pub struct Conversation {
    inner: Arc<ConversationInner>,
}

impl Conversation {
    pub(crate) fn new(registry: Arc<TopicRegistry>, stack: Stack, user_data: Value) -> Self {
        Self {
            inner: Arc::new(ConversationInner {
                registry,
                stack: Mutex::new(stack),
                user_data,
            }),
        }
    }

    /// A state bound to the top frame and owned by its topic, or the
    /// detached global context when the stack is empty.
    pub fn root_state(&self) -> Result<TopicState, TopicError> {
        let top = self
            .inner
            .with_stack(|stack| Ok(stack.top().map(|f| (f.id(), Arc::clone(f.topic())))))?;
        Ok(match top {
            Some((id, topic)) => TopicState::new(Arc::clone(&self.inner), Some(id), topic),
            None => self.global_state(None),
        })
    }

    pub(crate) fn global_state(&self, frame: Option<FrameId>) -> TopicState {
        TopicState::new(
            Arc::clone(&self.inner),
            frame,
            Arc::clone(self.inner.registry.global()),
        )
    }

    /// Consume the virgin flag, entering the main topic if one is registered.
    ///
    /// Does nothing on a conversation that has already started.
    pub async fn start(&self) -> Result<(), TopicError> {
        let first_turn = self.inner.with_stack(|stack| Ok(stack.take_virgin()))?;
        if !first_turn {
            return Ok(());
        }
        let Some(main) = self.inner.registry.main() else {
            tracing::debug!("yak.conversation.no_main");
            return Ok(());
        };
        let main = main.name().clone();
        let top = self.inner.with_stack(|stack| Ok(stack.top().map(|f| f.id())))?;
        self.global_state(top).enter_topic(main).await?;
        Ok(())
    }

    /// Route one message through the local then the global conditions.
    pub async fn dispatch(&self, input: InboundMessage) -> Result<Vec<OutboundMessage>, TopicError> {
        dispatch::dispatch(self, input).await
    }

    /// The storable form of the current stack.
    pub fn to_serializable(&self) -> Result<SerializableStack, TopicError> {
        self.inner.with_stack(|stack| Ok(serialize::to_serializable(stack)))
    }

    /// Number of frames.
    pub fn len(&self) -> Result<usize, TopicError> {
        self.inner.with_stack(|stack| Ok(stack.len()))
    }

    /// True when no frames are stacked.
    pub fn is_empty(&self) -> Result<bool, TopicError> {
        Ok(self.len()? == 0)
    }

    /// Names of the stacked topics, bottom to top.
    pub fn topic_names(&self) -> Result<Vec<TopicName>, TopicError> {
        self.inner.with_stack(|stack| {
            Ok(stack.frames().iter().map(|f| f.topic().name().clone()).collect())
        })
    }

    /// Host-supplied data for this turn.
    pub fn user_data(&self) -> &Value {
        &self.inner.user_data
    }

    pub(crate) fn inner(&self) -> &Arc<ConversationInner> {
        &self.inner
    }
}

impl fmt::Debug for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversation")
            .field("topics", &self.topic_names().unwrap_or_default())
            .finish()
    }
}
