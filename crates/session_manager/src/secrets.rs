//! Secret storage for the access token

use crate::error::{Result, SessionError};
use crate::storage::{JsonFileStore, KeyValueStore};
use async_trait::async_trait;
use chat_core::encryption::{self, SecretKey};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

/// Opaque platform secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Secrets encrypted with AES-256-GCM inside a JSON key-value file.
pub struct EncryptedFileSecretStore {
    inner: JsonFileStore,
    key: SecretKey,
}

impl EncryptedFileSecretStore {
    pub fn new<P: AsRef<Path>>(path: P, key: SecretKey) -> Self {
        Self {
            inner: JsonFileStore::new(path),
            key,
        }
    }

    /// Open the store, resolving the key from the environment or `key_file`.
    pub fn open<P: AsRef<Path>>(path: P, key_file: &Path) -> Result<Self> {
        let key = encryption::resolve_key(key_file)
            .map_err(|e| SessionError::SecretError(e.to_string()))?;
        Ok(Self::new(path, key))
    }
}

#[async_trait]
impl SecretStore for EncryptedFileSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(encrypted) = self.inner.get(key).await? else {
            return Ok(None);
        };
        encryption::decrypt(&encrypted, &self.key)
            .map(Some)
            .map_err(|e| SessionError::SecretError(format!("Failed to decrypt {key}: {e}")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let encrypted = encryption::encrypt(value, &self.key)
            .map_err(|e| SessionError::SecretError(e.to_string()))?;
        self.inner.set(key, encrypted).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}

#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.secrets.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.secrets
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.secrets.write().await.remove(key);
        Ok(())
    }
}
