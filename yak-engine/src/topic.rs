//! Topics: named, reusable units of dialog behaviour.
//!
//! A topic is built once at composition time and then lives in the
//! registry for the lifetime of the process. Everything that varies per
//! conversation lives in the stack frames that instantiate it.

use crate::condition::Condition;
use crate::reply::Reply;
use crate::state::TopicState;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use yak_core::{CallbackName, TopicError, TopicName};

type InitFn = dyn Fn(Value, Value) -> BoxFuture<'static, Result<Value, TopicError>> + Send + Sync;

type AfterInitFn = dyn Fn(TopicState) -> BoxFuture<'static, Result<(), TopicError>> + Send + Sync;

/// Signature of a topic callback: the parent-side handler that receives a
/// child topic's result when the child exits.
pub type CallbackFn =
    dyn Fn(TopicState, Value) -> BoxFuture<'static, Result<Reply, TopicError>> + Send + Sync;

/// A shared callback, as stored on its topic and on the frames that use it.
pub type Callback = Arc<CallbackFn>;

/// A registry-resident topic definition.
pub struct Topic {
    name: TopicName,
    init: Arc<InitFn>,
    is_root: bool,
    conditions: Vec<Condition>,
    callbacks: BTreeMap<CallbackName, Callback>,
    after_init: Option<Arc<AfterInitFn>>,
}

impl Topic {
    /// Start defining a topic whose frames get their data from `init`.
    ///
    /// `init` receives the arguments passed to `enter_topic` and the
    /// conversation's user data, and returns the new frame's data.
    pub fn define<F, Fut>(name: impl Into<TopicName>, init: F) -> TopicBuilder
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, TopicError>> + Send + 'static,
    {
        let init: Arc<InitFn> = Arc::new(move |args, user_data| init(args, user_data).boxed());
        TopicBuilder {
            topic: Topic {
                name: name.into(),
                init,
                is_root: false,
                conditions: Vec::new(),
                callbacks: BTreeMap::new(),
                after_init: None,
            },
        }
    }

    /// Start defining a topic whose frames start with `null` data.
    pub fn builder(name: impl Into<TopicName>) -> TopicBuilder {
        Self::define(name, |_args, _user_data| async { Ok(Value::Null) })
    }

    /// The topic's registry name.
    pub fn name(&self) -> &TopicName {
        &self.name
    }

    /// Whether entering this topic replaces the whole stack.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Conditions in declaration order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Look up a callback by name.
    pub fn callback(&self, name: &str) -> Option<&Callback> {
        self.callbacks.get(name)
    }

    /// Names of all callbacks defined on this topic.
    pub fn callback_names(&self) -> impl Iterator<Item = &CallbackName> {
        self.callbacks.keys()
    }

    pub(crate) fn init(&self, args: Value, user_data: Value) -> BoxFuture<'static, Result<Value, TopicError>> {
        (self.init)(args, user_data)
    }

    pub(crate) fn after_init(&self, state: TopicState) -> Option<BoxFuture<'static, Result<(), TopicError>>> {
        self.after_init.as_ref().map(|f| f(state))
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.name)
            .field("is_root", &self.is_root)
            .field("conditions", &self.conditions)
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .field("after_init", &self.after_init.is_some())
            .finish()
    }
}

/// Builder returned by [`Topic::define`] and [`Topic::builder`].
pub struct TopicBuilder {
    topic: Topic,
}

impl TopicBuilder {
    /// Mark the topic as a root: entering it discards every stacked frame.
    pub fn root(mut self) -> Self {
        self.topic.is_root = true;
        self
    }

    /// Set whether the topic is a root.
    pub fn is_root(mut self, is_root: bool) -> Self {
        self.topic.is_root = is_root;
        self
    }

    /// Append a condition. Declaration order is match order.
    pub fn condition(mut self, condition: Condition) -> Self {
        self.topic.conditions.push(condition);
        self
    }

    /// Append several conditions, preserving their order.
    pub fn conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.topic.conditions.extend(conditions);
        self
    }

    /// Register a callback that child topics entered from this topic can
    /// report back to. Redefining a name replaces the earlier callback.
    pub fn callback<F, Fut>(mut self, name: impl Into<CallbackName>, callback: F) -> Self
    where
        F: Fn(TopicState, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, TopicError>> + Send + 'static,
    {
        let callback: Callback = Arc::new(move |state, args| callback(state, args).boxed());
        self.topic.callbacks.insert(name.into(), callback);
        self
    }

    /// Run `after_init` once a new frame of this topic is live on the
    /// stack, with a state bound to that frame.
    pub fn after_init<F, Fut>(mut self, after_init: F) -> Self
    where
        F: Fn(TopicState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TopicError>> + Send + 'static,
    {
        self.topic.after_init = Some(Arc::new(move |state| after_init(state).boxed()));
        self
    }

    /// Finish the definition.
    pub fn build(self) -> Topic {
        self.topic
    }
}
