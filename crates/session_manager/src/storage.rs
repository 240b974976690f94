//! Key-value storage and the transcript persisted on top of it

use crate::error::{Result, SessionError};
use async_trait::async_trait;
use chat_core::ConversationTranscript;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

/// Storage key of the persisted conversation.
pub const CONVERSATION_KEY: &str = "flowforge-ai.conversation";

/// Plain string key-value storage (the extension's global state).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// All keys in one pretty-printed JSON object on disk.
pub struct JsonFileStore {
    path: PathBuf,
    // serialises read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, contents).await?;
        Ok(())
    }

    /// A corrupt file is replaced rather than blocking every later write.
    async fn read_map_for_update(&self) -> BTreeMap<String, String> {
        match self.read_map().await {
            Ok(map) => map,
            Err(err) => {
                log::warn!(
                    "Discarding unreadable store {}: {}",
                    self.path.display(),
                    err
                );
                BTreeMap::new()
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map_for_update().await;
        map.insert(key.to_string(), value);
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map_for_update().await;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

/// Process-local store, used when nothing should touch the disk.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Persists the conversation as a JSON string under [`CONVERSATION_KEY`].
#[derive(Clone)]
pub struct TranscriptStore {
    store: Arc<dyn KeyValueStore>,
}

impl TranscriptStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Load the stored transcript. Missing or malformed data yields an empty one.
    pub async fn load(&self) -> ConversationTranscript {
        let raw = match self.store.get(CONVERSATION_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return ConversationTranscript::new(),
            Err(err) => {
                log::warn!("Error reading conversation data: {}", err);
                return ConversationTranscript::new();
            }
        };

        match serde_json::from_str::<ConversationTranscript>(&raw) {
            Ok(transcript) => transcript,
            Err(err) => {
                log::warn!("Error parsing conversation data: {}", err);
                ConversationTranscript::new()
            }
        }
    }

    pub async fn save(&self, transcript: &ConversationTranscript) -> Result<()> {
        let raw = serde_json::to_string(transcript)?;
        self.store
            .set(CONVERSATION_KEY, raw)
            .await
            .map_err(|e| SessionError::StorageError(format!("Failed to save conversation: {e}")))
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(CONVERSATION_KEY).await
    }
}
