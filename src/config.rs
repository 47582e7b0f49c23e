use crate::error::{OutfitAiError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const SEARCH_ENGINE_ID_ENV: &str = "SEARCH_ENGINE_ID";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
    pub search_result_count: u8,
    pub search_image_size: String,
    pub search_safe: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            google_api_key: None,
            search_engine_id: None,
            model: "gemini-2.5-flash".into(),
            timeout_seconds: 60,
            search_result_count: 10,
            search_image_size: "large".into(),
            search_safe: "active".into(),
        }
    }
}

impl Config {
    /// 設定ファイルと環境変数（.env を含む）から読み込む
    pub fn load() -> Result<Self> {
        // .env は無くてもよい
        let _ = dotenvy::dotenv();

        let config_path = Self::config_path()?;
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| OutfitAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("outfit-ai").join("config.json"))
    }

    /// 環境変数を優先して上書き（空の値は無視）
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(GEMINI_API_KEY_ENV) {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = non_empty(GOOGLE_API_KEY_ENV) {
            self.google_api_key = Some(key);
        }
        if let Some(id) = non_empty(SEARCH_ENGINE_ID_ENV) {
            self.search_engine_id = Some(id);
        }
        self
    }

    pub fn get_gemini_api_key(&self) -> Result<String> {
        self.gemini_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(OutfitAiError::MissingApiKey)
    }

    pub fn set_gemini_api_key(&mut self, key: String) -> Result<()> {
        self.gemini_api_key = Some(key);
        self.save()
    }

    pub fn set_google_api_key(&mut self, key: String) -> Result<()> {
        self.google_api_key = Some(key);
        self.save()
    }

    pub fn set_search_engine_id(&mut self, id: String) -> Result<()> {
        self.search_engine_id = Some(id);
        self.save()
    }
}
