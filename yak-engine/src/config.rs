//! Configuration for the engine and the store-backed runner.

use serde::{Deserialize, Serialize};
use yak_core::{DurationMs, TopicName};

/// Static configuration for an [`Engine`](crate::Engine) and its registry.
///
/// Deserializable so hosts can keep it next to their own settings; every
/// field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Topic auto-entered on a conversation's first message.
    pub main_topic: TopicName,

    /// Fallback topic consulted when the active topic does not match.
    pub global_topic: TopicName,

    /// Fail registry validation when no main topic is registered.
    pub require_main: bool,
}

impl EngineConfig {
    /// Use a different main topic name.
    pub fn with_main_topic(mut self, name: impl Into<TopicName>) -> Self {
        self.main_topic = name.into();
        self
    }

    /// Use a different global topic name.
    pub fn with_global_topic(mut self, name: impl Into<TopicName>) -> Self {
        self.global_topic = name.into();
        self
    }

    /// Require a main topic at registration time.
    pub fn with_require_main(mut self, require: bool) -> Self {
        self.require_main = require;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            main_topic: TopicName::new("main"),
            global_topic: TopicName::new("global"),
            require_main: false,
        }
    }
}

/// Configuration for a [`ConversationRunner`](crate::ConversationRunner).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Deadline for one turn. The engine itself never times out; without
    /// this a hung predicate or handler hangs the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_timeout: Option<DurationMs>,
}

impl RunnerConfig {
    /// Abort turns that run longer than `timeout`.
    pub fn with_turn_timeout(mut self, timeout: impl Into<DurationMs>) -> Self {
        self.turn_timeout = Some(timeout.into());
        self
    }
}
