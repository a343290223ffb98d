//! Entering, exiting and clearing topics.
//!
//! Every stack mutation is guarded by the same ownership rule: only a
//! state bound to the top frame (or the detached global context while
//! the stack is empty) may change the stack. A rejected transition leaves
//! the stack exactly as it was.

use crate::reply::Reply;
use crate::stack::BoundCallback;
use crate::state::TopicState;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use yak_core::{CallbackName, TopicError, TopicName};

const ENTER_FROM_INACTIVE: &str = "a new topic can only be entered from the last context";
const EXIT_FROM_INACTIVE: &str = "only the current context can exit";

/// A request to enter a topic.
///
/// ```
/// use yak_engine::EnterTopic;
///
/// let request = EnterTopic::new("validate")
///     .args(serde_json::json!({"attempts": 3}))
///     .callback("onValidateName");
/// assert_eq!(request.topic(), "validate");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EnterTopic {
    topic: TopicName,
    args: Value,
    parent: Option<TopicName>,
    callback: Option<CallbackName>,
}

impl EnterTopic {
    /// Enter `topic` with `null` arguments, parented to the calling topic.
    pub fn new(topic: impl Into<TopicName>) -> Self {
        Self {
            topic: topic.into(),
            args: Value::Null,
            parent: None,
            callback: None,
        }
    }

    /// Arguments passed to the topic's `init`.
    pub fn args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    /// Parent topic. Defaults to the topic that owns the calling state.
    pub fn parent(mut self, parent: impl Into<TopicName>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Callback on the parent topic to run when the new topic exits.
    pub fn callback(mut self, callback: impl Into<CallbackName>) -> Self {
        self.callback = Some(callback.into());
        self
    }

    /// The topic to enter.
    pub fn topic(&self) -> &TopicName {
        &self.topic
    }
}

impl From<&str> for EnterTopic {
    fn from(topic: &str) -> Self {
        Self::new(topic)
    }
}

impl From<String> for EnterTopic {
    fn from(topic: String) -> Self {
        Self::new(topic)
    }
}

impl From<TopicName> for EnterTopic {
    fn from(topic: TopicName) -> Self {
        Self::new(topic)
    }
}

impl TopicState {
    /// Enter a topic from this state.
    ///
    /// Names are resolved and ownership is checked before the topic's
    /// `init` runs; ownership is checked again once `init` returns. Root
    /// topics replace the whole stack without running any callbacks,
    /// other topics are pushed. The new topic's `after_init` hook runs
    /// once its frame is live.
    ///
    /// Returns a state bound to the new frame.
    pub async fn enter_topic(&self, request: impl Into<EnterTopic>) -> Result<TopicState, TopicError> {
        let EnterTopic {
            topic,
            args,
            parent,
            callback,
        } = request.into();

        let registry = &self.conversation.registry;
        let topic = Arc::clone(registry.find_topic(topic.as_str())?);
        let parent = match parent {
            Some(name) => Arc::clone(registry.find_topic(name.as_str())?),
            None => Arc::clone(&self.owner),
        };
        let callback = callback
            .map(|name| BoundCallback::resolve(&parent, name))
            .transpose()?;

        self.ensure_active(ENTER_FROM_INACTIVE)?;
        let data = topic
            .init(args, self.conversation.user_data.clone())
            .await?;

        let frame = self.conversation.with_stack(|stack| {
            if !stack.is_active(self.frame) {
                return Err(TopicError::IllegalTopicTransition(ENTER_FROM_INACTIVE.into()));
            }
            let frame = stack.new_frame(Arc::clone(&topic), data, Some(Arc::clone(&parent)), callback);
            let id = frame.id();
            stack.enter(frame);
            Ok(id)
        })?;

        info!(
            topic = %topic.name(),
            parent = %parent.name(),
            root = topic.is_root(),
            "yak.topic.enter"
        );

        let state = TopicState::new(Arc::clone(&self.conversation), Some(frame), Arc::clone(&topic));
        if let Some(after_init) = topic.after_init(state.clone()) {
            after_init.await?;
        }
        Ok(state)
    }

    /// Pop this state's frame off the stack.
    ///
    /// If the frame was entered with a callback, the callback runs with a
    /// state bound to the newly exposed parent frame, and its reply is the
    /// result of the exit. Otherwise the result is [`Reply::Nothing`].
    pub async fn exit_topic(&self, args: Value) -> Result<Reply, TopicError> {
        let (popped, exposed) = self.conversation.with_stack(|stack| {
            match stack.top() {
                Some(top) if Some(top.id()) == self.frame => {}
                _ => return Err(TopicError::IllegalTopicTransition(EXIT_FROM_INACTIVE.into())),
            }
            let popped = stack
                .pop()
                .ok_or_else(|| TopicError::IllegalTopicTransition(EXIT_FROM_INACTIVE.into()))?;
            Ok((popped, stack.top().map(|f| f.id())))
        })?;

        info!(
            topic = %popped.topic.name(),
            callback = ?popped.callback_name().map(CallbackName::as_str),
            "yak.topic.exit"
        );

        let Some(callback) = popped.callback else {
            return Ok(Reply::Nothing);
        };
        let owner = popped
            .parent
            .unwrap_or_else(|| Arc::clone(self.conversation.registry.global()));
        let parent_state = TopicState::new(Arc::clone(&self.conversation), exposed, owner);
        (callback.handler)(parent_state, args).await
    }

    /// Remove every frame. No callbacks run.
    ///
    /// From the detached global context on an empty stack this is a no-op.
    pub fn clear_all_topics(&self) -> Result<(), TopicError> {
        self.conversation.with_stack(|stack| {
            if !stack.is_active(self.frame) {
                return Err(TopicError::IllegalTopicTransition(EXIT_FROM_INACTIVE.into()));
            }
            let cleared = stack.len();
            stack.clear();
            info!(cleared, "yak.topic.clear");
            Ok(())
        })
    }

    /// Block the named global conditions while this frame is on top.
    ///
    /// Overwrites any previous deny-list. Only consulted while the
    /// allow-list is empty.
    pub fn disable_conditions<I, S>(&self, names: I) -> Result<(), TopicError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect();
        self.with_bound_frame(|frame| frame.disabled_conditions = names)
    }

    /// Allow only the named global conditions while this frame is on top.
    ///
    /// Overwrites any previous allow-list. A non-empty allow-list takes
    /// precedence over the deny-list.
    pub fn disable_conditions_except<I, S>(&self, names: I) -> Result<(), TopicError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect();
        self.with_bound_frame(|frame| frame.active_conditions = names)
    }

    fn with_bound_frame(&self, f: impl FnOnce(&mut crate::stack::Frame)) -> Result<(), TopicError> {
        let Some(id) = self.frame else {
            debug!("yak.conditions.detached");
            return Ok(());
        };
        self.conversation.with_stack(|stack| {
            let frame = stack.frame_mut(id).ok_or(TopicError::StaleContext)?;
            f(frame);
            Ok(())
        })
    }

    fn ensure_active(&self, message: &str) -> Result<(), TopicError> {
        if self.is_active()? {
            Ok(())
        } else {
            Err(TopicError::IllegalTopicTransition(message.into()))
        }
    }
}
