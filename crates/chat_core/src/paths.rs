use std::path::{Path, PathBuf};

/// FlowForge data directory (~/.flowforge), overridable with `FLOWFORGE_HOME`.
pub fn flowforge_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("FLOWFORGE_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".flowforge")
}

/// Settings file
pub fn config_json_path() -> PathBuf {
    flowforge_dir().join("config.json")
}

/// Key-value state file holding the persisted conversation
pub fn state_json_path() -> PathBuf {
    flowforge_dir().join("state.json")
}

/// Encrypted secrets file
pub fn secrets_json_path() -> PathBuf {
    flowforge_dir().join("secrets.json")
}

/// Generated encryption key used when no passphrase is configured
pub fn secret_key_path() -> PathBuf {
    flowforge_dir().join("secret.key")
}

pub fn ensure_flowforge_dir() -> std::io::Result<PathBuf> {
    let dir = flowforge_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn load_config_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config: {e}"))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse config: {e}"))
}

pub fn save_config_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory: {e}"))?;
    }
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;
    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write config: {e}"))
}
