//! 外部API連携

pub mod gemini;
pub mod search;

pub use gemini::GeminiClient;
pub use search::{SearchClient, SearchOptions};

/// 通信エラーを画面向けの短い文に変換
pub(crate) fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("could not connect: {}", e)
    } else {
        e.to_string()
    }
}
