#![deny(missing_docs)]
//! Filesystem-backed implementation of yak-core's ConversationStore trait.
//!
//! Each conversation is one pretty-printed `.json` file under the root,
//! named after the percent-encoded conversation id. State survives
//! process restarts and can be inspected with a text editor.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use yak_core::error::StoreError;
use yak_core::id::ConversationId;
use yak_core::snapshot::SerializableStack;
use yak_core::store::ConversationStore;

/// Filesystem-backed conversation store.
///
/// Directory layout:
/// ```text
/// root/
///   <percent-encoded-id>.json
/// ```
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a new filesystem store rooted at the given directory.
    ///
    /// The directory is created lazily on first save.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// The directory conversations are stored in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &ConversationId) -> PathBuf {
        self.root.join(id_to_filename(id.as_str()))
    }

    /// Ids of all stored conversations, in no particular order.
    ///
    /// Files that do not decode to an id are skipped.
    pub async fn conversation_ids(&self) -> Result<Vec<ConversationId>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(StoreError::ReadFailed(e.to_string())),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
        {
            if let Some(id) = entry.file_name().to_str().and_then(filename_to_id) {
                ids.push(ConversationId::new(id));
            }
        }
        Ok(ids)
    }
}

/// Encode an id into a safe filename.
fn id_to_filename(id: &str) -> String {
    let mut encoded = String::with_capacity(id.len() + 5);
    for byte in id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded.push_str(".json");
    encoded
}

/// Decode a filename back to an id.
fn filename_to_id(filename: &str) -> Option<String> {
    let name = filename.strip_suffix(".json")?;
    let bytes = name.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = std::str::from_utf8(bytes.get(i + 1..i + 3)?).ok()?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

#[async_trait]
impl ConversationStore for FsStore {
    async fn get(&self, id: &ConversationId) -> Result<Option<SerializableStack>, StoreError> {
        let path = self.path_for(id);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let stack = serde_json::from_str(&contents)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(stack))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadFailed(e.to_string())),
        }
    }

    async fn save(&self, id: &ConversationId, stack: &SerializableStack) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let contents = serde_json::to_string_pretty(stack)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let path = self.path_for(id);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        tracing::debug!(conversation = %id, path = %path.display(), "yak.store.save");
        Ok(())
    }

    async fn clear(&self, id: &ConversationId) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::WriteFailed(e.to_string())),
        }
    }
}
