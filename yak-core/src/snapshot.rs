//! The persisted form of a conversation.
//!
//! Live frames hold references to registry topics and callbacks. Those
//! cannot cross a process boundary, so every frame is projected onto a
//! [`SerializableFrame`] where topic and callback identity are names.

use crate::id::{CallbackName, TopicName};
use serde::{Deserialize, Serialize};

/// A conversation's topic stack as stored between turns.
///
/// `Default` is the state of a conversation that has never been
/// dispatched to: no frames, virgin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableStack {
    /// Frames from bottom to top; the last one is the active context.
    pub items: Vec<SerializableFrame>,
    /// True until the first dispatch auto-enters the main topic.
    pub virgin: bool,
}

impl SerializableStack {
    /// A fresh virgin stack.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            virgin: true,
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no frames are stacked.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The active (top) frame, if any.
    pub fn top(&self) -> Option<&SerializableFrame> {
        self.items.last()
    }
}

impl Default for SerializableStack {
    fn default() -> Self {
        Self::new()
    }
}

/// One stack frame with topic identity reduced to names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableFrame {
    /// The topic's context data, copied verbatim.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Allow-list for global conditions. Non-empty wins over the deny-list.
    #[serde(default)]
    pub active_condition_names: Vec<String>,
    /// Deny-list for global conditions.
    #[serde(default)]
    pub disabled_condition_names: Vec<String>,
    /// Registry name of the frame's topic.
    pub topic_name: TopicName,
    /// Registry name of the topic that entered this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_topic_name: Option<TopicName>,
    /// Callback on the parent topic to run when this frame exits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_name: Option<CallbackName>,
}

impl SerializableFrame {
    /// A frame for `topic` with null data and no lists, parent or callback.
    pub fn new(topic: impl Into<TopicName>) -> Self {
        Self {
            data: serde_json::Value::Null,
            active_condition_names: Vec::new(),
            disabled_condition_names: Vec::new(),
            topic_name: topic.into(),
            parent_topic_name: None,
            callback_name: None,
        }
    }
}
