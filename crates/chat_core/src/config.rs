use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::paths::{load_config_json, save_config_json};

pub const DEFAULT_SELECTED_MODEL: &str = "openai/o4-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_LEGACY_MODEL: &str = "copilot";
pub const DEFAULT_API_BASE: &str = "https://models.github.ai/inference";

const CONFIG_FILE_PATH: &str = "config.toml";

/// User-facing settings for the chat panel.
///
/// The access token is deliberately not part of this struct; it lives in the
/// secret store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub selected_model: String,
    pub temperature: f32,
    pub save_history: bool,
    /// Legacy setting kept for compatibility, not used when sending.
    pub default_model: String,
    pub api_base: String,
    pub http_proxy: String,
    pub https_proxy: String,
}

/// Partial settings update sent from the panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_history: Option<bool>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.selected_model.is_none() && self.temperature.is_none() && self.save_history.is_none()
    }
}

fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn clamp_temperature(value: f32) -> f32 {
    if value.is_nan() {
        return DEFAULT_TEMPERATURE;
    }
    value.clamp(0.0, 1.0)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selected_model: DEFAULT_SELECTED_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            save_history: true,
            default_model: DEFAULT_LEGACY_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            http_proxy: String::new(),
            https_proxy: String::new(),
        }
    }
}

impl Settings {
    /// Settings file layer plus environment overrides.
    pub fn load_from(json_path: &Path) -> Self {
        let mut settings = Self::load_file(json_path);
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings.temperature = clamp_temperature(settings.temperature);
        settings
    }

    /// Only what is on disk: `json_path`, else `config.toml` in the working
    /// directory, else defaults. This is the layer updates are written back to.
    pub fn load_file(json_path: &Path) -> Self {
        let mut settings = Settings::default();

        let mut loaded = false;
        if json_path.exists() {
            match load_config_json::<Settings>(json_path) {
                Ok(file_settings) => {
                    settings = file_settings;
                    loaded = true;
                }
                Err(err) => log::warn!("Ignoring settings file: {err}"),
            }
        }

        if !loaded && Path::new(CONFIG_FILE_PATH).exists() {
            if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_PATH) {
                if let Ok(file_settings) = toml::from_str::<Settings>(&content) {
                    settings = file_settings;
                }
            }
        }

        settings.temperature = clamp_temperature(settings.temperature);
        settings
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        save_config_json(path, self)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("FLOWFORGE_MODEL") {
            self.selected_model = model;
        }
        if let Some(temperature) = lookup("FLOWFORGE_TEMPERATURE") {
            match temperature.trim().parse::<f32>() {
                Ok(value) => self.temperature = value,
                Err(_) => log::warn!("Ignoring FLOWFORGE_TEMPERATURE={temperature:?}"),
            }
        }
        if let Some(save_history) = lookup("FLOWFORGE_SAVE_HISTORY") {
            self.save_history = parse_bool_env(&save_history);
        }
        if let Some(api_base) = lookup("FLOWFORGE_API_BASE") {
            self.api_base = api_base;
        }
        if let Some(http_proxy) = lookup("HTTP_PROXY") {
            self.http_proxy = http_proxy;
        }
        if let Some(https_proxy) = lookup("HTTPS_PROXY") {
            self.https_proxy = https_proxy;
        }
    }

    /// Merge a partial update into these settings.
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(model) = &update.selected_model {
            self.selected_model = model.trim().to_string();
        }
        if let Some(temperature) = update.temperature {
            self.temperature = clamp_temperature(temperature);
        }
        if let Some(save_history) = update.save_history {
            self.save_history = save_history;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parse_bool_env_true_values() {
        for value in ["1", "true", "TRUE", " yes ", "Y", "on"] {
            assert!(parse_bool_env(value), "value {value:?} should be true");
        }
    }

    #[test]
    fn parse_bool_env_false_values() {
        for value in ["0", "false", "no", "off", "", "  "] {
            assert!(!parse_bool_env(value), "value {value:?} should be false");
        }
    }

    #[test]
    fn defaults_match_extension_manifest() {
        let settings = Settings::default();
        assert_eq!(settings.selected_model, "openai/o4-mini");
        assert_eq!(settings.temperature, 0.7);
        assert!(settings.save_history);
        assert_eq!(settings.default_model, "copilot");
        assert_eq!(settings.api_base, "https://models.github.ai/inference");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"selectedModel":"openai/gpt-4.1"}"#).unwrap();
        assert_eq!(settings.selected_model, "openai/gpt-4.1");
        assert_eq!(settings.temperature, DEFAULT_TEMPERATURE);
        assert!(settings.save_history);
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FLOWFORGE_MODEL", "mistral-ai/codestral"),
            ("FLOWFORGE_TEMPERATURE", "0.2"),
            ("FLOWFORGE_SAVE_HISTORY", "off"),
        ]);
        let mut settings = Settings::default();
        settings.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.selected_model, "mistral-ai/codestral");
        assert_eq!(settings.temperature, 0.2);
        assert!(!settings.save_history);
    }

    #[test]
    fn unparsable_temperature_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(|key| (key == "FLOWFORGE_TEMPERATURE").then(|| "warm".to_string()));
        assert_eq!(settings.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn apply_update_clamps_temperature() {
        let mut settings = Settings::default();
        settings.apply(&SettingsUpdate {
            selected_model: Some("  openai/gpt-4o  ".into()),
            temperature: Some(3.5),
            save_history: Some(false),
        });
        assert_eq!(settings.selected_model, "openai/gpt-4o");
        assert_eq!(settings.temperature, 1.0);
        assert!(!settings.save_history);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut settings = Settings::default();
        settings.selected_model = "openai/gpt-4.1-mini".into();
        settings.save_to(&path).unwrap();

        let loaded: Settings = load_config_json(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn load_file_clamps_and_keeps_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"temperature": 7.0, "apiBase": "http://proxy.local"}"#).unwrap();

        let settings = Settings::load_file(&path);
        assert_eq!(settings.temperature, 1.0);
        assert_eq!(settings.api_base, "http://proxy.local");
        assert_eq!(settings.selected_model, DEFAULT_SELECTED_MODEL);
    }
}
