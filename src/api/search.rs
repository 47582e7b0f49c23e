//! Google Custom Search 連携（類似商品の画像検索）

use super::describe_transport_error;
use crate::config::{Config, GOOGLE_API_KEY_ENV, SEARCH_ENGINE_ID_ENV};
use crate::error::{OutfitAiError, Result};
use outfit_ai_common::{collect_suggestions, provider_error_message, SearchResponse, ShoppingSuggestion};
use std::time::Duration;
use tracing::{debug, warn};

pub const CUSTOM_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// 検索パラメータ（固定値）
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub result_count: u8,
    pub image_size: String,
    pub safe: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            result_count: 10,
            image_size: "large".into(),
            safe: "active".into(),
        }
    }
}

/// 類似商品検索クライアント
///
/// 認証情報は呼び出し時に検査する。欠けていれば通信せずに `Configuration` を返す。
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    api_key: Option<String>,
    search_engine_id: Option<String>,
    options: SearchOptions,
    endpoint: String,
}

impl SearchClient {
    pub fn new(
        api_key: Option<String>,
        search_engine_id: Option<String>,
        options: SearchOptions,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OutfitAiError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))?;
        Ok(Self {
            http,
            api_key,
            search_engine_id,
            options,
            endpoint: CUSTOM_SEARCH_ENDPOINT.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.google_api_key.clone(),
            config.search_engine_id.clone(),
            SearchOptions {
                result_count: config.search_result_count,
                image_size: config.search_image_size.clone(),
                safe: config.search_safe.clone(),
            },
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// 接続先を差し替える（テスト用のローカルサーバーなど）
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// 認証情報を取り出す（空文字は未設定扱い）
    fn credentials(&self) -> Result<(&str, &str)> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(OutfitAiError::Configuration {
                setting: "Google API key",
                env: GOOGLE_API_KEY_ENV,
                flag: "--set-google-key",
            })?;
        let engine_id = self
            .search_engine_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(OutfitAiError::Configuration {
                setting: "Search engine ID",
                env: SEARCH_ENGINE_ID_ENV,
                flag: "--set-search-engine-id",
            })?;
        Ok((api_key, engine_id))
    }

    /// アイテム名で類似商品を検索
    ///
    /// 結果0件・`items` なし・全件除外はいずれも空のVecで返す。
    pub async fn search(&self, query: &str) -> Result<Vec<ShoppingSuggestion>> {
        let (api_key, engine_id) = self.credentials()?;
        let num = self.options.result_count.to_string();

        debug!(%query, "calling Custom Search");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("key", api_key),
                ("cx", engine_id),
                ("q", query),
                ("searchType", "image"),
                ("imgSize", self.options.image_size.as_str()),
                ("safe", self.options.safe.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OutfitAiError::Search(describe_transport_error(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OutfitAiError::Search(describe_transport_error(&e)))?;

        if !status.is_success() {
            let message = provider_error_message(status.as_u16(), &body);
            warn!(status = status.as_u16(), %message, "Custom Search request failed");
            return Err(OutfitAiError::Search(message));
        }

        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| OutfitAiError::Search(format!("unexpected search response: {}", e)))?;
        let raw_count = parsed.items.len();
        let suggestions = collect_suggestions(parsed.items);

        debug!(raw_count, kept = suggestions.len(), "Custom Search responded");
        Ok(suggestions)
    }
}
