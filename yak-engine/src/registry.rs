//! Topic registry: the static name → topic table built once per process.

use crate::config::EngineConfig;
use crate::topic::Topic;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;
use yak_core::{TopicError, TopicName};

/// Every topic an engine knows about, validated at construction.
///
/// Exactly one topic carries the configured global name. At most one
/// carries the main name, and it is only mandatory when
/// [`EngineConfig::require_main`] is set.
#[derive(Debug)]
pub struct TopicRegistry {
    topics: HashMap<TopicName, Arc<Topic>>,
    order: Vec<TopicName>,
    global: Arc<Topic>,
    main: Option<Arc<Topic>>,
    config: EngineConfig,
}

impl TopicRegistry {
    /// Build a registry with the default configuration.
    pub fn new(topics: impl IntoIterator<Item = Topic>) -> Result<Self, TopicError> {
        Self::with_config(topics, EngineConfig::default())
    }

    /// Build a registry with an explicit configuration.
    pub fn with_config(
        topics: impl IntoIterator<Item = Topic>,
        config: EngineConfig,
    ) -> Result<Self, TopicError> {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for topic in topics {
            let name = topic.name().clone();
            warn_on_duplicate_conditions(&topic);
            if map.insert(name.clone(), Arc::new(topic)).is_some() {
                return Err(TopicError::InvalidRegistry(format!(
                    "topic {name} is registered more than once"
                )));
            }
            order.push(name);
        }

        let global = map.get(&config.global_topic).cloned().ok_or_else(|| {
            TopicError::InvalidRegistry(format!(
                "no global topic named {}",
                config.global_topic
            ))
        })?;

        let main = map.get(&config.main_topic).cloned();
        if main.is_none() && config.require_main {
            return Err(TopicError::InvalidRegistry(format!(
                "no main topic named {}",
                config.main_topic
            )));
        }

        Ok(Self {
            topics: map,
            order,
            global,
            main,
            config,
        })
    }

    /// Start a builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Resolve a topic by name.
    pub fn find_topic(&self, name: &str) -> Result<&Arc<Topic>, TopicError> {
        self.get(name)
            .ok_or_else(|| TopicError::UnknownTopic(name.to_string()))
    }

    /// Look up a topic by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Topic>> {
        self.topics.get(name)
    }

    /// The global fallback topic.
    pub fn global(&self) -> &Arc<Topic> {
        &self.global
    }

    /// The topic auto-entered on a conversation's first turn.
    pub fn main(&self) -> Option<&Arc<Topic>> {
        self.main.as_ref()
    }

    /// The configuration the registry was validated against.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of registered topics, including global and main.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false for a validated registry, which holds at least the
    /// global topic.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Topic names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &TopicName> {
        self.order.iter()
    }
}

fn warn_on_duplicate_conditions(topic: &Topic) {
    let mut seen = HashSet::new();
    for condition in topic.conditions() {
        if !seen.insert(condition.name()) {
            warn!(
                topic = %topic.name(),
                condition = condition.name(),
                "duplicate condition name; only the first can match"
            );
        }
    }
}

/// Collects topics and configuration for a [`TopicRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    topics: Vec<Topic>,
    config: EngineConfig,
}

impl RegistryBuilder {
    /// Add a topic.
    pub fn register(mut self, topic: Topic) -> Self {
        self.topics.push(topic);
        self
    }

    /// Add several topics.
    pub fn register_all(mut self, topics: impl IntoIterator<Item = Topic>) -> Self {
        self.topics.extend(topics);
        self
    }

    /// Use `config` for validation and lookups.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<TopicRegistry, TopicError> {
        TopicRegistry::with_config(self.topics, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(names: &[&str]) -> Vec<Topic> {
        names.iter().map(|n| Topic::builder(*n).build()).collect()
    }

    #[test]
    fn finds_registered_topics() {
        let registry = TopicRegistry::new(topics(&["global", "main", "math"])).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.find_topic("math").unwrap().name(), "math");
        assert_eq!(registry.global().name(), "global");
        assert_eq!(registry.main().map(|t| t.name().as_str()), Some("main"));
        let names: Vec<_> = registry.names().map(TopicName::as_str).collect();
        assert_eq!(names, ["global", "main", "math"]);
    }

    #[test]
    fn unknown_topic_is_an_error() {
        let registry = TopicRegistry::new(topics(&["global"])).unwrap();
        let err = registry.find_topic("nope").unwrap_err();
        assert!(matches!(err, TopicError::UnknownTopic(name) if name == "nope"));
    }

    #[test]
    fn global_is_required() {
        let err = TopicRegistry::new(topics(&["main"])).unwrap_err();
        assert!(matches!(err, TopicError::InvalidRegistry(_)));
    }

    #[test]
    fn main_is_optional_unless_required() {
        let registry = TopicRegistry::new(topics(&["global"])).unwrap();
        assert!(registry.main().is_none());

        let err = TopicRegistry::builder()
            .register_all(topics(&["global"]))
            .config(EngineConfig::default().with_require_main(true))
            .build()
            .unwrap_err();
        assert!(matches!(err, TopicError::InvalidRegistry(_)));
    }

    #[test]
    fn duplicate_topic_names_are_rejected() {
        let err = TopicRegistry::new(topics(&["global", "math", "math"])).unwrap_err();
        assert!(matches!(err, TopicError::InvalidRegistry(msg) if msg.contains("math")));
    }

    #[test]
    fn configured_names_are_used() {
        let config = EngineConfig::default()
            .with_global_topic("fallback")
            .with_main_topic("welcome");
        let registry = TopicRegistry::with_config(topics(&["fallback", "welcome"]), config).unwrap();
        assert_eq!(registry.global().name(), "fallback");
        assert_eq!(registry.main().map(|t| t.name().as_str()), Some("welcome"));
    }
}
