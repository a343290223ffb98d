//! Store-backed host loop.
//!
//! The engine itself never touches storage. [`ConversationRunner`] is the
//! glue a host would otherwise write by hand: load, parse, handle, save,
//! format, one conversation id at a time.

use crate::config::RunnerConfig;
use crate::engine::Engine;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::Instrument;
use yak_core::{
    ConversationId, ConversationStore, DurationMs, ExternalMessage, FormatError, InboundMessage,
    MessageFormatter, OutboundMessage, StoreError, TopicError,
};

/// Errors returned by [`ConversationRunner`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Topic code or the engine failed.
    #[error("topic error: {0}")]
    Topic(#[from] TopicError),
    /// The conversation store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// The formatter rejected a message.
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    /// The turn ran past [`RunnerConfig::turn_timeout`]. Nothing was saved.
    #[error("turn exceeded its deadline of {0}")]
    DeadlineExceeded(DurationMs),
    /// The runner's own bookkeeping failed.
    #[error("internal error: {0}")]
    Internal(String),
}

type TurnLock = Arc<tokio::sync::Mutex<()>>;

/// Runs turns against a [`ConversationStore`] and a [`MessageFormatter`].
///
/// Turns for the same conversation id are serialized; turns for different
/// ids run concurrently. A failed turn saves nothing, so the stored state
/// is always the state after the last successful turn.
pub struct ConversationRunner {
    engine: Engine,
    store: Arc<dyn ConversationStore>,
    formatter: Arc<dyn MessageFormatter>,
    config: RunnerConfig,
    locks: Mutex<HashMap<ConversationId, TurnLock>>,
}

impl ConversationRunner {
    /// Create a runner with the default configuration.
    pub fn new(
        engine: Engine,
        store: Arc<dyn ConversationStore>,
        formatter: Arc<dyn MessageFormatter>,
    ) -> Self {
        Self {
            engine,
            store,
            formatter,
            config: RunnerConfig::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// The engine turns are run on.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Parse one raw channel message, run it and format the output.
    pub async fn process(
        &self,
        id: &ConversationId,
        raw: ExternalMessage,
        user_data: Option<Value>,
    ) -> Result<Vec<ExternalMessage>, RunnerError> {
        let input = self.formatter.parse_incoming(raw)?;
        let output = self.handle_message(id, input, user_data).await?;
        self.format_all(&output)
    }

    /// Merge several raw messages that arrived together into one turn.
    pub async fn process_batch(
        &self,
        id: &ConversationId,
        raw: Vec<ExternalMessage>,
        user_data: Option<Value>,
    ) -> Result<Vec<ExternalMessage>, RunnerError> {
        let input = self.formatter.merge_incoming(raw)?;
        let output = self.handle_message(id, input, user_data).await?;
        self.format_all(&output)
    }

    /// Run one already-parsed message.
    pub async fn handle_message(
        &self,
        id: &ConversationId,
        input: InboundMessage,
        user_data: Option<Value>,
    ) -> Result<Vec<OutboundMessage>, RunnerError> {
        let slot = self.slot(id)?;
        let _turn = slot.lock.lock().await;
        self.run_turn(id, input, user_data)
            .instrument(tracing::info_span!("yak.turn", conversation = %id))
            .await
    }

    /// Forget a conversation. Its next message starts a fresh, virgin stack.
    pub async fn reset(&self, id: &ConversationId) -> Result<(), RunnerError> {
        let slot = self.slot(id)?;
        let _turn = slot.lock.lock().await;
        self.store.clear(id).await?;
        tracing::info!(conversation = %id, "yak.conversation.reset");
        Ok(())
    }

    async fn run_turn(
        &self,
        id: &ConversationId,
        input: InboundMessage,
        user_data: Option<Value>,
    ) -> Result<Vec<OutboundMessage>, RunnerError> {
        let state = self.store.get(id).await?;
        let turn = self.engine.handle(input, state, user_data);
        let response = match self.config.turn_timeout {
            Some(limit) => tokio::time::timeout(limit.to_std(), turn)
                .await
                .map_err(|_| {
                    tracing::warn!(conversation = %id, timeout = %limit, "yak.turn.deadline_exceeded");
                    RunnerError::DeadlineExceeded(limit)
                })??,
            None => turn.await?,
        };
        self.store.save(id, &response.state).await?;
        Ok(response.output)
    }

    fn format_all(&self, output: &[OutboundMessage]) -> Result<Vec<ExternalMessage>, RunnerError> {
        output
            .iter()
            .map(|message| self.formatter.format_outgoing(message).map_err(RunnerError::from))
            .collect()
    }

    fn slot(&self, id: &ConversationId) -> Result<TurnSlot<'_>, RunnerError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| RunnerError::Internal(e.to_string()))?;
        let lock = Arc::clone(locks.entry(id.clone()).or_default());
        Ok(TurnSlot {
            locks: &self.locks,
            id: id.clone(),
            lock,
        })
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

// A claim on one conversation's turn lock. Dropping it, whether the turn
// finished or its future was dropped, forgets the lock once no other turn
// holds or waits on it.
struct TurnSlot<'a> {
    locks: &'a Mutex<HashMap<ConversationId, TurnLock>>,
    id: ConversationId,
    lock: TurnLock,
}

impl Drop for TurnSlot<'_> {
    fn drop(&mut self) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        // The map's entry plus ours.
        if locks.get(&self.id).is_some_and(|lock| Arc::strong_count(lock) == 2) {
            locks.remove(&self.id);
        }
    }
}
