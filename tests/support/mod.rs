//! テスト用のローカルHTTPサーバー
//!
//! 受け取ったリクエストを記録し、用意したレスポンスを順に返す（最後の1件は繰り返す）。

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// パス + クエリ文字列
    pub target: String,
    pub body: String,
}

impl RecordedRequest {
    /// デコード済みのクエリパラメータ
    pub fn query_param(&self, name: &str) -> Option<String> {
        let url = reqwest::Url::parse(&format!("http://localhost{}", self.target)).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }
}

#[derive(Clone)]
struct ServerState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responses: Arc<Vec<(u16, String)>>,
    served: Arc<AtomicUsize>,
    delay: Duration,
}

pub struct MockServer {
    base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        Self::start_with_delay(responses, Duration::ZERO).await
    }

    /// 応答前に `delay` だけ待つサーバー（タイムアウト確認用）
    pub async fn start_with_delay(responses: Vec<(u16, String)>, delay: Duration) -> Self {
        assert!(!responses.is_empty(), "at least one response is required");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            requests: requests.clone(),
            responses: Arc::new(responses),
            served: Arc::new(AtomicUsize::new(0)),
            delay,
        };
        let app = Router::new().fallback(respond).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
        let base = format!("http://{}", listener.local_addr().expect("no local addr"));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// すべてのパスを受ける共通ハンドラ
async fn respond(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    body: String,
) -> impl IntoResponse {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        target: uri.to_string(),
        body,
    });

    let served = state.served.fetch_add(1, Ordering::SeqCst);
    let (status, body) = state.responses[served.min(state.responses.len() - 1)].clone();

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// Gemini の generateContent 応答（本文テキストを1パートで返す）
pub fn gemini_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

/// Google API 形式のエラー応答
pub fn google_error_body(status: u16, message: &str) -> String {
    serde_json::json!({
        "error": {"code": status, "message": message, "status": "RESOURCE_EXHAUSTED"}
    })
    .to_string()
}

/// JPEGのマジックナンバーを持つ小さなファイル内容
pub const JPEG_BYTES: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01,
    0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];
