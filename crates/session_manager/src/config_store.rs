//! Reads and writes the token and settings that make up a [`SessionConfig`]

use crate::error::{Result, SessionError};
use crate::secrets::SecretStore;
use crate::structs::SessionConfig;
use chat_core::{Settings, SettingsUpdate};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Secret store key of the access token.
pub const API_KEY_SECRET: &str = "flowforge-ai.apiKey";

/// Environment variable consulted when no token has been stored.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

pub struct ConfigStore {
    secrets: Arc<dyn SecretStore>,
    settings_path: PathBuf,
    token_fallback: Option<String>,
}

impl ConfigStore {
    pub fn new<P: AsRef<Path>>(secrets: Arc<dyn SecretStore>, settings_path: P) -> Self {
        Self {
            secrets,
            settings_path: settings_path.as_ref().to_path_buf(),
            token_fallback: std::env::var(TOKEN_ENV_VAR).ok(),
        }
    }

    /// Replace the token taken from the environment.
    pub fn with_token_fallback(mut self, token: Option<String>) -> Self {
        self.token_fallback = token;
        self
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Stored token, else the environment fallback. Blank values count as absent.
    ///
    /// A token that can no longer be decrypted counts as absent too, so it can
    /// be replaced with `set_api_key`.
    pub async fn api_key(&self) -> Result<Option<String>> {
        let stored = match self.secrets.get(API_KEY_SECRET).await {
            Ok(stored) => stored,
            Err(SessionError::SecretError(err)) => {
                log::warn!("Ignoring unreadable stored API key: {}", err);
                None
            }
            Err(err) => return Err(err),
        };
        let token = stored
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.token_fallback.clone())
            .filter(|key| !key.trim().is_empty());
        Ok(token)
    }

    pub async fn set_api_key(&self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(SessionError::ConfigError("API key must not be empty".into()));
        }
        self.secrets.set(API_KEY_SECRET, api_key).await?;
        log::info!("API key saved");
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        Settings::load_from(&self.settings_path)
    }

    /// Apply `update` to the settings file and return the effective settings.
    ///
    /// Environment overrides are never written back to the file.
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings> {
        let mut stored = Settings::load_file(&self.settings_path);
        stored.apply(update);
        stored
            .save_to(&self.settings_path)
            .map_err(SessionError::ConfigError)?;
        log::info!(
            "Settings updated: model={} temperature={} save_history={}",
            stored.selected_model,
            stored.temperature,
            stored.save_history
        );
        Ok(self.settings())
    }

    pub async fn load(&self) -> Result<SessionConfig> {
        Ok(SessionConfig::new(self.api_key().await?, self.settings()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{EncryptedFileSecretStore, MemorySecretStore};
    use chat_core::encryption::key_from_passphrase;
    use tempfile::tempdir;

    fn store(dir: &Path) -> ConfigStore {
        ConfigStore::new(Arc::new(MemorySecretStore::new()), dir.join("config.json"))
            .with_token_fallback(None)
    }

    #[tokio::test]
    async fn test_no_token_by_default() {
        let dir = tempdir().unwrap();
        assert_eq!(store(dir.path()).api_key().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stored_token_wins_over_fallback() {
        let dir = tempdir().unwrap();
        let config = store(dir.path()).with_token_fallback(Some("from-env".into()));
        assert_eq!(config.api_key().await.unwrap().as_deref(), Some("from-env"));

        config.set_api_key("  ghp_stored ").await.unwrap();
        assert_eq!(config.api_key().await.unwrap().as_deref(), Some("ghp_stored"));
    }

    #[tokio::test]
    async fn test_blank_token_rejected() {
        let dir = tempdir().unwrap();
        assert!(store(dir.path()).set_api_key("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_update_settings_persists() {
        let dir = tempdir().unwrap();
        let config = store(dir.path());
        config
            .update_settings(&SettingsUpdate {
                selected_model: Some("openai/gpt-4.1".into()),
                temperature: None,
                save_history: Some(false),
            })
            .unwrap();

        let reloaded: Settings =
            chat_core::paths::load_config_json(&dir.path().join("config.json")).unwrap();
        assert_eq!(reloaded.selected_model, "openai/gpt-4.1");
        assert!(!reloaded.save_history);
    }

    #[tokio::test]
    async fn test_update_does_not_persist_env_overrides() {
        let dir = tempdir().unwrap();
        let config = store(dir.path());

        std::env::set_var("FLOWFORGE_API_BASE", "http://one-off-debug:9");
        let effective = config.update_settings(&SettingsUpdate {
            temperature: Some(0.3),
            ..Default::default()
        });
        std::env::remove_var("FLOWFORGE_API_BASE");
        assert_eq!(effective.unwrap().api_base, "http://one-off-debug:9");

        let on_disk: Settings =
            chat_core::paths::load_config_json(&dir.path().join("config.json")).unwrap();
        assert_eq!(on_disk.api_base, chat_core::config::DEFAULT_API_BASE);
        assert_eq!(on_disk.temperature, 0.3);
        assert_eq!(config.settings().api_base, chat_core::config::DEFAULT_API_BASE);
    }

    #[tokio::test]
    async fn test_undecryptable_token_counts_as_missing() {
        let dir = tempdir().unwrap();
        let secrets_path = dir.path().join("secrets.json");
        let settings_path = dir.path().join("config.json");

        ConfigStore::new(
            Arc::new(EncryptedFileSecretStore::new(&secrets_path, key_from_passphrase("old"))),
            &settings_path,
        )
        .with_token_fallback(None)
        .set_api_key("ghp_old")
        .await
        .unwrap();

        let rekeyed = ConfigStore::new(
            Arc::new(EncryptedFileSecretStore::new(&secrets_path, key_from_passphrase("new"))),
            &settings_path,
        )
        .with_token_fallback(Some("ghp_env".into()));
        assert_eq!(rekeyed.api_key().await.unwrap().as_deref(), Some("ghp_env"));

        let rekeyed = rekeyed.with_token_fallback(None);
        let loaded = rekeyed.load().await.unwrap();
        assert_eq!(loaded.api_key, None);
        assert!(!loaded.is_configured());

        // a fresh token replaces the unreadable one
        rekeyed.set_api_key("ghp_new").await.unwrap();
        assert_eq!(rekeyed.api_key().await.unwrap().as_deref(), Some("ghp_new"));
    }

    #[tokio::test]
    async fn test_load_combines_token_and_settings() {
        let dir = tempdir().unwrap();
        let config = store(dir.path());
        config.set_api_key("ghp_x").await.unwrap();

        let loaded = config.load().await.unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("ghp_x"));
        assert!(loaded.is_configured());
    }
}
