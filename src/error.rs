use thiserror::Error;

/// 抽出失敗時にユーザーへ見せるメッセージ（原因の種類によらず共通）
pub const ANALYSIS_FAILED_MESSAGE: &str = "Sorry, we couldn't analyze that outfit. The image might be unclear or the items couldn't be identified. Please try another photo.";

/// 画像ファイルを読めなかったときのメッセージ
pub const READ_FAILED_MESSAGE: &str = "There was an error processing your image file. Please try again.";

#[derive(Error, Debug)]
pub enum OutfitAiError {
    /// 受け付けない画像形式
    #[error("Unsupported image type: {0}. Use PNG, JPEG or WebP")]
    Validation(String),

    #[error("Failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 通信・モデル側の失敗（一時的な失敗として扱う）
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// モデルの出力がスキーマに合わない（内容起因の失敗）
    #[error("Model response did not match the item schema: {0}")]
    SchemaViolation(String),

    /// 検索に必要な設定が欠けている
    #[error("{setting} is not configured. Set {env} in your environment or run `outfit-ai config {flag}`")]
    Configuration {
        setting: &'static str,
        env: &'static str,
        flag: &'static str,
    },

    /// 検索APIの失敗。メッセージはプロバイダのものをそのまま使う
    #[error("{0}")]
    Search(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("Gemini APIキーが設定されていません。`outfit-ai config --set-gemini-key YOUR_KEY` で設定するか GEMINI_API_KEY を指定してください")]
    MissingApiKey,

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] outfit_ai_common::Error),
}

impl OutfitAiError {
    /// 画面に出す文言に変換
    ///
    /// 抽出系の失敗はひとつの文言にまとめる。検索系はプロバイダのメッセージを添える。
    pub fn user_message(&self) -> String {
        match self {
            OutfitAiError::Extraction(_) | OutfitAiError::SchemaViolation(_) => {
                ANALYSIS_FAILED_MESSAGE.to_string()
            }
            OutfitAiError::Read { .. } => READ_FAILED_MESSAGE.to_string(),
            OutfitAiError::Search(message) => format!("Failed to find items. {}", message),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OutfitAiError>;
