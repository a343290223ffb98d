#![deny(missing_docs)]
//! In-memory implementation of yak-core's ConversationStore trait.
//!
//! Uses a `HashMap` behind a `RwLock` for concurrent access. Stacks are
//! held as JSON values rather than as `SerializableStack`, so every save
//! and load goes through the same serde path a persistent backend would.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use yak_core::error::StoreError;
use yak_core::id::ConversationId;
use yak_core::snapshot::SerializableStack;
use yak_core::store::ConversationStore;

/// In-memory conversation store backed by a `HashMap` behind a `RwLock`.
///
/// Suitable for testing, prototyping, and single-process bots where
/// conversations need not survive a restart.
pub struct MemoryStore {
    data: RwLock<HashMap<ConversationId, serde_json::Value>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored conversations.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// True when no conversation is stored.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    /// Ids of all stored conversations, in no particular order.
    pub async fn conversation_ids(&self) -> Vec<ConversationId> {
        self.data.read().await.keys().cloned().collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn get(&self, id: &ConversationId) -> Result<Option<SerializableStack>, StoreError> {
        let data = self.data.read().await;
        match data.get(id) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn save(&self, id: &ConversationId, stack: &SerializableStack) -> Result<(), StoreError> {
        let value =
            serde_json::to_value(stack).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut data = self.data.write().await;
        data.insert(id.clone(), value);
        Ok(())
    }

    async fn clear(&self, id: &ConversationId) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        data.remove(id);
        Ok(())
    }
}
