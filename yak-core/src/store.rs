//! The Store protocol: where conversations live between turns.

use crate::error::StoreError;
use crate::id::ConversationId;
use crate::snapshot::SerializableStack;
use async_trait::async_trait;

/// Persists serialized conversation stacks keyed by conversation id.
///
/// Implementations:
/// - MemoryStore: HashMap (testing, single process)
/// - FsStore: one JSON file per conversation
///
/// A store must hand back exactly what it was given: every field of
/// [`SerializableStack`] and its frames. Losing any of them breaks
/// rehydration on the next turn. Eviction and lifetime of entries are
/// the store's own concern.
///
/// The engine performs no locking. Two turns for the same id must never
/// run concurrently; whoever calls the engine owns that guarantee.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load a conversation. Returns None if nothing was saved under `id`.
    async fn get(&self, id: &ConversationId) -> Result<Option<SerializableStack>, StoreError>;

    /// Save a conversation. Creates or overwrites.
    async fn save(&self, id: &ConversationId, state: &SerializableStack) -> Result<(), StoreError>;

    /// Forget a conversation. No-op if nothing was saved under `id`.
    async fn clear(&self, id: &ConversationId) -> Result<(), StoreError>;
}
