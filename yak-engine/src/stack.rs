//! The per-conversation context stack.
//!
//! The stack is an arena of frames. Frames never point at each other or
//! back at the stack; a [`TopicState`](crate::TopicState) names its frame
//! by [`FrameId`], and the frame below the top is simply the previous
//! element.

use crate::topic::{Callback, Topic};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use yak_core::{CallbackName, TopicError};

/// Identity of a frame within one loaded stack.
///
/// Ids come from a per-stack counter and are never reused, so a handle to
/// a popped frame cannot alias a newer frame at the same depth. They are
/// not persisted; rehydration hands out fresh ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

/// A callback resolved against the parent topic of a frame.
#[derive(Clone)]
pub(crate) struct BoundCallback {
    pub(crate) name: CallbackName,
    pub(crate) handler: Callback,
}

impl BoundCallback {
    /// Resolve `name` on `parent`, failing if the parent does not define it.
    pub(crate) fn resolve(parent: &Topic, name: CallbackName) -> Result<Self, TopicError> {
        let handler = parent
            .callback(name.as_str())
            .cloned()
            .ok_or_else(|| TopicError::UnknownCallback {
                topic: parent.name().to_string(),
                callback: name.to_string(),
            })?;
        Ok(Self { name, handler })
    }
}

/// One instantiation of a topic for one conversation.
pub struct Frame {
    pub(crate) id: FrameId,
    pub(crate) data: Value,
    pub(crate) active_conditions: Vec<String>,
    pub(crate) disabled_conditions: Vec<String>,
    pub(crate) topic: Arc<Topic>,
    pub(crate) parent: Option<Arc<Topic>>,
    pub(crate) callback: Option<BoundCallback>,
}

impl Frame {
    /// The frame's id.
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// The topic this frame instantiates.
    pub fn topic(&self) -> &Arc<Topic> {
        &self.topic
    }

    /// The topic that entered this one.
    pub fn parent_topic(&self) -> Option<&Arc<Topic>> {
        self.parent.as_ref()
    }

    /// The frame's data.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Allow-list for global conditions.
    pub fn active_condition_names(&self) -> &[String] {
        &self.active_conditions
    }

    /// Deny-list for global conditions.
    pub fn disabled_condition_names(&self) -> &[String] {
        &self.disabled_conditions
    }

    /// Name of the parent callback that runs when this frame exits.
    pub fn callback_name(&self) -> Option<&CallbackName> {
        self.callback.as_ref().map(|cb| &cb.name)
    }

    /// The resolved callback, shared with the parent topic's definition.
    pub fn callback(&self) -> Option<&Callback> {
        self.callback.as_ref().map(|cb| &cb.handler)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("topic", self.topic.name())
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("callback", &self.callback_name())
            .field("data", &self.data)
            .field("active_conditions", &self.active_conditions)
            .field("disabled_conditions", &self.disabled_conditions)
            .finish()
    }
}

/// Ordered frames (last = active) plus the one-shot virgin flag.
#[derive(Debug)]
pub struct Stack {
    frames: Vec<Frame>,
    virgin: bool,
    next_id: u64,
    // Data written through the detached global context; dropped with the turn.
    detached_data: Value,
}

impl Stack {
    /// A fresh stack for a conversation that has never been dispatched to.
    pub fn new() -> Self {
        Self::with_virgin(true)
    }

    pub(crate) fn with_virgin(virgin: bool) -> Self {
        Self {
            frames: Vec::new(),
            virgin,
            next_id: 0,
            detached_data: Value::Null,
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no frames are stacked.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether the main topic still has to be auto-entered.
    pub fn is_virgin(&self) -> bool {
        self.virgin
    }

    /// Frames from bottom to top.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The active frame.
    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Clear the virgin flag, returning whether it was set.
    pub(crate) fn take_virgin(&mut self) -> bool {
        std::mem::replace(&mut self.virgin, false)
    }

    /// Build a frame with a fresh id and empty condition lists.
    pub(crate) fn new_frame(
        &mut self,
        topic: Arc<Topic>,
        data: Value,
        parent: Option<Arc<Topic>>,
        callback: Option<BoundCallback>,
    ) -> Frame {
        let id = FrameId(self.next_id);
        self.next_id += 1;
        Frame {
            id,
            data,
            active_conditions: Vec::new(),
            disabled_conditions: Vec::new(),
            topic,
            parent,
            callback,
        }
    }

    /// Whether a state bound to `frame` may change the stack: it must be
    /// bound to the top frame, or be detached while the stack is empty.
    pub(crate) fn is_active(&self, frame: Option<FrameId>) -> bool {
        match (frame, self.frames.last()) {
            (None, None) => true,
            (Some(id), Some(top)) => top.id == id,
            _ => false,
        }
    }

    /// Root frames replace the stack; others are pushed.
    pub(crate) fn enter(&mut self, frame: Frame) {
        if frame.topic.is_root() {
            self.frames.clear();
        }
        self.frames.push(frame);
    }

    pub(crate) fn push_restored(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub(crate) fn clear(&mut self) {
        self.frames.clear();
    }

    pub(crate) fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.iter().rev().find(|f| f.id == id)
    }

    pub(crate) fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.iter_mut().rev().find(|f| f.id == id)
    }

    pub(crate) fn detached_data(&self) -> &Value {
        &self.detached_data
    }

    pub(crate) fn set_detached_data(&mut self, data: Value) {
        self.detached_data = data;
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
