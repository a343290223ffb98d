//! InMemoryStore: HashMap-backed ConversationStore for testing.

use crate::error::StoreError;
use crate::id::ConversationId;
use crate::snapshot::SerializableStack;
use crate::store::ConversationStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store that keeps stacks as typed values, plus a save counter
/// so tests can assert how often the runner persisted.
pub struct InMemoryStore {
    data: RwLock<HashMap<ConversationId, SerializableStack>>,
    saves: RwLock<usize>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            saves: RwLock::new(0),
        }
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.read().map(|n| *n).unwrap_or_default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn get(&self, id: &ConversationId) -> Result<Option<SerializableStack>, StoreError> {
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        Ok(data.get(id).cloned())
    }

    async fn save(&self, id: &ConversationId, state: &SerializableStack) -> Result<(), StoreError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        data.insert(id.clone(), state.clone());
        let mut saves = self
            .saves
            .write()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        *saves += 1;
        Ok(())
    }

    async fn clear(&self, id: &ConversationId) -> Result<(), StoreError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        data.remove(id);
        Ok(())
    }
}
