//! 画像の取り込み
//!
//! 形式チェック → 非同期読み込み → プレビュー確保 → Base64化 の順に処理する。
//! 形式チェックに失敗した場合はファイルを読まず、ネットワークにも触れない。

use crate::error::{OutfitAiError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// 受け付ける画像形式
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// 解析サービスへ送る画像データ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub base64: String,
    pub mime_type: String,
}

/// 取り込み結果
#[derive(Debug)]
pub struct IngestedImage {
    pub display: DisplayHandle,
    pub payload: ImagePayload,
}

/// 表示用リソースの確保・解放
pub trait PreviewStore: Send + Sync + std::fmt::Debug {
    /// リソースを確保し、表示に使う参照（パスやURL）を返す
    ///
    /// `mime_type` は検証済みの受け付け形式。
    fn acquire(&self, mime_type: &str, bytes: &[u8]) -> Result<String>;

    /// 確保したリソースを解放する
    fn release(&self, locator: &str);
}

/// 表示用リソースの所有者
///
/// Drop 時にストアの `release` をちょうど1回呼ぶ。
#[derive(Debug)]
pub struct DisplayHandle {
    locator: String,
    store: Arc<dyn PreviewStore>,
}

impl DisplayHandle {
    pub fn acquire(store: Arc<dyn PreviewStore>, mime_type: &str, bytes: &[u8]) -> Result<Self> {
        let locator = store.acquire(mime_type, bytes)?;
        debug!(%locator, "display resource acquired");
        Ok(Self { locator, store })
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        debug!(locator = %self.locator, "display resource released");
        self.store.release(&self.locator);
    }
}

/// 一時ディレクトリにプレビュー用のコピーを置くストア
#[derive(Debug)]
pub struct TempPreviewStore {
    dir: PathBuf,
    counter: AtomicU64,
    /// Drop 時にディレクトリも消す（自前で作った場合のみ）
    remove_dir_on_drop: bool,
}

impl TempPreviewStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            counter: AtomicU64::new(0),
            remove_dir_on_drop: false,
        })
    }

    /// プロセスごとの既定ディレクトリ
    pub fn in_temp_dir() -> Result<Self> {
        let dir = std::env::temp_dir()
            .join("outfit-ai-previews")
            .join(std::process::id().to_string());
        Ok(Self::new(dir)?.remove_dir_on_drop())
    }

    fn remove_dir_on_drop(mut self) -> Self {
        self.remove_dir_on_drop = true;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PreviewStore for TempPreviewStore {
    fn acquire(&self, mime_type: &str, bytes: &[u8]) -> Result<String> {
        // ファイル名は連番とハッシュのみ（元のファイル名は使わない）
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let digest = hex::encode(Sha256::digest(bytes));
        let ext = ImageFormat::from_mime_type(mime_type)
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("img");
        let dest = self.dir.join(format!("{}-{}.{}", seq, &digest[..16], ext));
        std::fs::write(&dest, bytes)?;
        Ok(dest.display().to_string())
    }

    fn release(&self, locator: &str) {
        if let Err(e) = std::fs::remove_file(locator) {
            warn!(%locator, error = %e, "failed to remove preview file");
        }
    }
}

impl Drop for TempPreviewStore {
    fn drop(&mut self) {
        if self.remove_dir_on_drop {
            // 解放漏れのファイルが残っていれば消さずに残す
            if let Err(e) = std::fs::remove_dir(&self.dir) {
                debug!(dir = %self.dir.display(), error = %e, "preview directory not removed");
            }
        }
    }
}

/// MIMEタイプが受け付け可能か確認
pub fn validate_mime_type(mime_type: &str) -> Result<&'static str> {
    let normalized = mime_type.trim().to_ascii_lowercase();
    ACCEPTED_MIME_TYPES
        .iter()
        .copied()
        .find(|accepted| *accepted == normalized)
        .ok_or_else(|| OutfitAiError::Validation(mime_type.trim().to_string()))
}

/// 拡張子から宣言上のMIMEタイプを求める
pub fn mime_type_from_path(path: &Path) -> Option<&'static str> {
    ImageFormat::from_path(path).ok().map(|f| f.to_mime_type())
}

/// 先頭バイトからMIMEタイプを推定
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

/// 形式を判定できなかったファイルの表示名（拡張子があればそれを使う）
fn unknown_type_label(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()).filter(|e| !e.is_empty()) {
        Some(ext) => format!(".{} file", ext.to_ascii_lowercase()),
        None => "application/octet-stream".to_string(),
    }
}

/// 画像取り込み
#[derive(Debug, Clone)]
pub struct Ingestor {
    store: Arc<dyn PreviewStore>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn PreviewStore>) -> Self {
        Self { store }
    }

    /// 画像ファイルを取り込む
    ///
    /// # Arguments
    /// * `path` - 画像ファイル
    /// * `declared_mime` - 明示されたMIMEタイプ（省略時は拡張子、次に内容から判定）
    pub async fn ingest(&self, path: &Path, declared_mime: Option<&str>) -> Result<IngestedImage> {
        let declared = declared_mime
            .map(str::to_string)
            .or_else(|| mime_type_from_path(path).map(str::to_string));

        // 宣言があれば読み込み前に検証する
        let checked = declared.as_deref().map(validate_mime_type).transpose()?;

        let bytes = tokio::fs::read(path).await.map_err(|source| OutfitAiError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let mime_type = match (checked, sniff_mime_type(&bytes)) {
            (Some(mime), _) => mime,
            (None, Some(sniffed)) => validate_mime_type(sniffed)?,
            (None, None) => return Err(OutfitAiError::Validation(unknown_type_label(path))),
        };

        let display = DisplayHandle::acquire(self.store.clone(), mime_type, &bytes)?;

        debug!(path = %path.display(), mime_type, bytes = bytes.len(), "image ingested");

        Ok(IngestedImage {
            display,
            payload: ImagePayload {
                base64: STANDARD.encode(&bytes),
                mime_type: mime_type.to_string(),
            },
        })
    }
}
