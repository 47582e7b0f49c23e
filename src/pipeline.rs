//! 解析パイプライン
//!
//! 取り込み → 抽出 → （選択時）検索 の順序を管理し、セッション状態を唯一の書き手として更新する。
//! 検索は `SearchRequest` からしか始められないため、抽出が成功するまで検索は発行されない。

use crate::api::{GeminiClient, SearchClient};
use crate::error::Result;
use crate::ingest::{DisplayHandle, ImagePayload, Ingestor};
use chrono::{DateTime, Utc};
use outfit_ai_common::{
    AnalysisTicket, Applied, IdentifiedItem, Phase, SearchRequest, SearchState, SearchTicket, Session,
    ShoppingSuggestion,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info};

/// 解析結果のレポート（JSON出力用）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analyzed_at: DateTime<Utc>,
    pub image: String,
    pub items: Vec<IdentifiedItem>,
    pub selected_item: Option<IdentifiedItem>,
    pub suggestions: Vec<ShoppingSuggestion>,
}

pub struct Pipeline {
    ingestor: Ingestor,
    extractor: GeminiClient,
    searcher: SearchClient,
    session: Session<DisplayHandle>,
}

impl Pipeline {
    pub fn new(ingestor: Ingestor, extractor: GeminiClient, searcher: SearchClient) -> Self {
        Self {
            ingestor,
            extractor,
            searcher,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session<DisplayHandle> {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// 画像を取り込み Loading に入る
    ///
    /// 形式エラー・読み込みエラーのときはセッションを変更しない。
    pub async fn begin_analysis(
        &mut self,
        path: &Path,
        declared_mime: Option<&str>,
    ) -> Result<(AnalysisTicket, ImagePayload)> {
        let ingested = self.ingestor.ingest(path, declared_mime).await?;
        let ticket = self.session.begin_upload(ingested.display);
        info!(path = %path.display(), "analysis started");
        Ok((ticket, ingested.payload))
    }

    /// 抽出APIを呼ぶ（セッションには触れない）
    pub async fn extract(&self, payload: &ImagePayload) -> Result<Vec<IdentifiedItem>> {
        self.extractor.extract(payload).await
    }

    /// 抽出結果をセッションに反映
    ///
    /// 失敗は種類によらずひとつの文言にまとめて Error フェーズへ。
    pub fn finish_analysis(
        &mut self,
        ticket: AnalysisTicket,
        outcome: Result<Vec<IdentifiedItem>>,
    ) -> Result<Applied> {
        let applied = match outcome {
            Ok(items) => {
                let count = items.len();
                let applied = self.session.complete_analysis(ticket, items)?;
                if applied == Applied::Current {
                    info!(items = count, "analysis finished");
                }
                applied
            }
            Err(e) => {
                error!(error = %e, "analysis failed");
                self.session.fail_analysis(ticket, e.user_message())?
            }
        };
        if applied == Applied::Stale {
            debug!("discarded analysis result for a superseded upload");
        }
        Ok(applied)
    }

    /// 取り込みから抽出結果の反映までを実行
    pub async fn analyze(&mut self, path: &Path, declared_mime: Option<&str>) -> Result<Phase> {
        let (ticket, payload) = self.begin_analysis(path, declared_mime).await?;
        let outcome = self.extract(&payload).await;
        self.finish_analysis(ticket, outcome)?;
        Ok(self.phase())
    }

    /// アイテムを選択（検索リクエストを発行）
    pub fn select(&mut self, index: usize) -> Result<SearchRequest> {
        Ok(self.session.select(index)?)
    }

    /// 検索APIを呼び、失敗は画面向けの文言に変換する（セッションには触れない）
    pub async fn fetch_suggestions(&self, query: &str) -> std::result::Result<Vec<ShoppingSuggestion>, String> {
        self.searcher.search(query).await.map_err(|e| {
            error!(%query, error = %e, "search failed");
            e.user_message()
        })
    }

    /// 検索結果を反映。選択が変わっていれば捨てる
    pub fn finish_search(
        &mut self,
        ticket: SearchTicket,
        outcome: std::result::Result<Vec<ShoppingSuggestion>, String>,
    ) -> Applied {
        let applied = self.session.finish_search(ticket, outcome);
        if applied == Applied::Stale {
            debug!(item_index = ticket.item_index(), "discarded stale search result");
        }
        applied
    }

    /// アイテムを選択して検索まで行う
    pub async fn show_item(&mut self, index: usize) -> Result<Option<&SearchState>> {
        let request = self.select(index)?;
        self.run_search(request).await
    }

    /// 自動選択されたアイテムの検索を行う
    pub async fn show_selected(&mut self) -> Result<Option<&SearchState>> {
        let request = self.session.search_selected()?;
        self.run_search(request).await
    }

    async fn run_search(&mut self, request: SearchRequest) -> Result<Option<&SearchState>> {
        let outcome = self.fetch_suggestions(&request.query).await;
        self.finish_search(request.ticket, outcome);
        Ok(self.session.search_state())
    }

    /// Idle に戻る（表示用リソースはここで解放される）
    pub fn reset(&mut self) {
        self.session.reset();
        debug!("session reset");
    }

    /// 現在の結果からレポートを作る（Results 以外では None）
    pub fn report(&self) -> Option<AnalysisReport> {
        let items = self.session.items()?;
        let suggestions = match self.session.search_state() {
            Some(SearchState::Ready(suggestions)) => suggestions.clone(),
            _ => Vec::new(),
        };
        Some(AnalysisReport {
            analyzed_at: Utc::now(),
            image: self
                .session
                .image()
                .map(|h| h.locator().to_string())
                .unwrap_or_default(),
            items: items.to_vec(),
            selected_item: self.session.selected_item().cloned(),
            suggestions,
        })
    }
}
