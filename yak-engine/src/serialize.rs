//! Projection between the live stack and its storable form.

use crate::registry::TopicRegistry;
use crate::stack::{BoundCallback, Stack};
use std::sync::Arc;
use yak_core::{SerializableFrame, SerializableStack, TopicError};

/// Reduce every frame's topic, parent and callback to names.
pub fn to_serializable(stack: &Stack) -> SerializableStack {
    SerializableStack {
        items: stack
            .frames()
            .iter()
            .map(|frame| SerializableFrame {
                data: frame.data().clone(),
                active_condition_names: frame.active_condition_names().to_vec(),
                disabled_condition_names: frame.disabled_condition_names().to_vec(),
                topic_name: frame.topic().name().clone(),
                parent_topic_name: frame.parent_topic().map(|p| p.name().clone()),
                callback_name: frame.callback_name().cloned(),
            })
            .collect(),
        virgin: stack.is_virgin(),
    }
}

/// Rebuild a live stack, resolving names against `registry`.
///
/// Resolved topics and callbacks are the registry's own entries, not
/// copies. Any name that does not resolve fails the whole load.
pub fn from_serializable(serialized: SerializableStack, registry: &TopicRegistry) -> Result<Stack, TopicError> {
    let mut stack = Stack::with_virgin(serialized.virgin);
    for item in serialized.items {
        let topic = Arc::clone(registry.find_topic(item.topic_name.as_str())?);
        let parent = item
            .parent_topic_name
            .as_ref()
            .map(|name| registry.find_topic(name.as_str()).map(Arc::clone))
            .transpose()?;
        let callback = match (item.callback_name, &parent) {
            (None, _) => None,
            (Some(name), Some(parent)) => Some(BoundCallback::resolve(parent, name)?),
            (Some(name), None) => {
                return Err(TopicError::InvalidState(format!(
                    "frame for topic {} names callback {name} but has no parent topic",
                    item.topic_name
                )));
            }
        };

        let mut frame = stack.new_frame(topic, item.data, parent, callback);
        frame.active_conditions = item.active_condition_names;
        frame.disabled_conditions = item.disabled_condition_names;
        stack.push_restored(frame);
    }
    Ok(stack)
}
