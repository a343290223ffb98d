//! Two-phase routing of one inbound message.
//!
//! The active topic's conditions are tried first, in declaration order.
//! If none matches, the global topic's conditions are tried, filtered by
//! the active frame's allow- and deny-lists. Exactly one handler runs per
//! message, and no match is an empty reply rather than an error.

use crate::state::{Conversation, TopicState};
use std::sync::Arc;
use tracing::debug;
use yak_core::{InboundMessage, OutboundMessage, TopicError};

type ConditionLists = (Vec<String>, Vec<String>);

/// Whether a global condition may run given the active frame's
/// `(allow, deny)` lists, or `None` when the stack is empty.
///
/// A non-empty allow-list admits only the names it contains and makes the
/// deny-list irrelevant. Otherwise every name not on the deny-list is
/// admitted.
pub fn is_eligible(lists: Option<(&[String], &[String])>, name: &str) -> bool {
    match lists {
        None => true,
        Some((allow, _)) if !allow.is_empty() => allow.iter().any(|n| n == name),
        Some((_, deny)) => !deny.iter().any(|n| n == name),
    }
}

pub(crate) async fn dispatch(
    conversation: &Conversation,
    input: InboundMessage,
) -> Result<Vec<OutboundMessage>, TopicError> {
    let inner = conversation.inner();
    let top = inner.with_stack(|stack| {
        Ok(stack.top().map(|f| {
            let lists: ConditionLists = (f.active_conditions.clone(), f.disabled_conditions.clone());
            (f.id(), Arc::clone(f.topic()), lists)
        }))
    })?;

    if let Some((id, topic, _)) = &top {
        let state = TopicState::new(Arc::clone(inner), Some(*id), Arc::clone(topic));
        for condition in topic.conditions() {
            if let Some(invocation) = condition.evaluate(state.clone(), input.clone()).await? {
                debug!(phase = "local", topic = %topic.name(), condition = condition.name(), "yak.dispatch.matched");
                return Ok(invocation(state).await?.into_messages());
            }
        }
    }

    // Local predicates see the state too, so take the lists as they are now.
    let lists = match &top {
        Some((id, _, captured)) => {
            let current = inner.with_stack(|stack| {
                Ok(stack
                    .frame(*id)
                    .map(|f| (f.active_conditions.clone(), f.disabled_conditions.clone())))
            })?;
            Some(current.unwrap_or_else(|| captured.clone()))
        }
        None => None,
    };
    let lists = lists.as_ref().map(|(allow, deny)| (allow.as_slice(), deny.as_slice()));

    let global = Arc::clone(inner.registry.global());
    let state = TopicState::new(
        Arc::clone(inner),
        top.as_ref().map(|(id, _, _)| *id),
        Arc::clone(&global),
    );
    for condition in global.conditions() {
        if !is_eligible(lists, condition.name()) {
            continue;
        }
        if let Some(invocation) = condition.evaluate(state.clone(), input.clone()).await? {
            debug!(phase = "global", topic = %global.name(), condition = condition.name(), "yak.dispatch.matched");
            return Ok(invocation(state).await?.into_messages());
        }
    }

    debug!("yak.dispatch.no_match");
    Ok(Vec::new())
}
