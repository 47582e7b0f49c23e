//! Gemini API連携（コーディネート解析）
//!
//! 画像1枚と固定プロンプトを送り、スキーマ付きのJSON応答を IdentifiedItem に変換する。

use super::describe_transport_error;
use crate::config::Config;
use crate::error::{OutfitAiError, Result};
use crate::ingest::ImagePayload;
use outfit_ai_common::{parse_items_response, provider_error_message, response_schema, IdentifiedItem, OUTFIT_PROMPT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.iter().find_map(|p| p.text.as_deref()))
    }
}

fn build_request(payload: &ImagePayload) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: payload.mime_type.clone(),
                        data: payload.base64.clone(),
                    },
                },
                Part::Text { text: OUTFIT_PROMPT.to_string() },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: response_schema(),
        },
    }
}

/// コーディネート解析クライアント
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OutfitAiError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))?;
        Ok(Self {
            http,
            api_key,
            model,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.get_gemini_api_key()?,
            config.model.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// 接続先を差し替える（テスト用のローカルサーバーなど）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
    }

    /// 画像からアイテムを抽出
    ///
    /// 通信・ステータス・タイムアウト・空応答は `Extraction`、
    /// 応答テキストがスキーマに合わない場合は `SchemaViolation`。
    pub async fn extract(&self, payload: &ImagePayload) -> Result<Vec<IdentifiedItem>> {
        let request = build_request(payload);
        debug!(model = %self.model, mime_type = %payload.mime_type, payload_len = payload.base64.len(), "calling Gemini");

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| OutfitAiError::Extraction(describe_transport_error(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OutfitAiError::Extraction(describe_transport_error(&e)))?;

        if !status.is_success() {
            let message = provider_error_message(status.as_u16(), &body);
            warn!(status = status.as_u16(), %message, "Gemini request failed");
            return Err(OutfitAiError::Extraction(message));
        }

        let envelope: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| OutfitAiError::Extraction(format!("unexpected Gemini envelope: {}", e)))?;
        let text = envelope
            .first_text()
            .ok_or_else(|| OutfitAiError::Extraction("model returned no content".into()))?;

        debug!(response_len = text.len(), "Gemini responded");

        parse_items_response(text).map_err(|e| OutfitAiError::SchemaViolation(e.to_string()))
    }
}
