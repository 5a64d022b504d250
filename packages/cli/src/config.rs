use atelier_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "atelier.config.json";

/// Atelier configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// JSON file backing the local record store
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Upload limits and session tuning
    #[serde(flatten)]
    pub editor: EditorConfig,
}

fn default_store_path() -> String {
    "atelier.store.json".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content).map_err(|e| {
                anyhow::anyhow!("Invalid {}: {}", config_path.display(), e)
            })?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            config
        } else {
            Config::default()
        };

        config.editor.validate()?;
        Ok(config)
    }

    /// Get absolute path to the store file
    pub fn get_store_path(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.store_path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            editor: EditorConfig::default(),
        }
    }
}
