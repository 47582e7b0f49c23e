//! 解析セッションの状態機械
//!
//! `Idle → Loading → {Results | Error} → Idle` の遷移をすべてメソッドで明示し、
//! 不正な遷移は状態を変えずに `Error::Transition` を返す。
//!
//! 表示用リソース `H` は Idle 以外の状態だけが保持する。アップロードの差し替えや
//! リセットで状態ごと破棄されるため、`H` の Drop がちょうど1回走る。
//!
//! 非同期の結果（抽出・検索）はチケットを持ち回り、適用時に現在の世代・選択と
//! 一致しなければ黙って捨てる（`Applied::Stale`）。

use crate::error::{Error, Result};
use crate::types::{IdentifiedItem, ShoppingSuggestion};

/// セッションのフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Results,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Results => "results",
            Phase::Error => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 抽出リクエストの識別子（アップロードごとに世代が進む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    generation: u64,
}

/// 検索リクエストの識別子（世代 + 選択中アイテム）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    item_index: usize,
}

impl SearchTicket {
    pub fn item_index(&self) -> usize {
        self.item_index
    }
}

/// 検索を開始するための情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub ticket: SearchTicket,
    /// 選択アイテムの itemName（そのまま検索クエリになる）
    pub query: String,
}

/// 選択中アイテムの検索状態（外側のフェーズとは独立）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Loading,
    Ready(Vec<ShoppingSuggestion>),
    Failed(String),
}

/// 非同期結果の適用結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    /// 古いリクエストの結果なので捨てた
    Stale,
}

#[derive(Debug)]
enum State<H> {
    Idle,
    Loading {
        image: H,
    },
    Results {
        image: H,
        items: Vec<IdentifiedItem>,
        selected: Option<usize>,
        search: SearchState,
        search_ticket: Option<SearchTicket>,
    },
    Error {
        image: H,
        message: String,
    },
}

impl<H> State<H> {
    fn phase(&self) -> Phase {
        match self {
            State::Idle => Phase::Idle,
            State::Loading { .. } => Phase::Loading,
            State::Results { .. } => Phase::Results,
            State::Error { .. } => Phase::Error,
        }
    }
}

/// 1回の解析セッション
#[derive(Debug)]
pub struct Session<H> {
    state: State<H>,
    generation: u64,
}

impl<H> Default for Session<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Session<H> {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            generation: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// 保持している表示用リソース
    pub fn image(&self) -> Option<&H> {
        match &self.state {
            State::Idle => None,
            State::Loading { image } | State::Error { image, .. } | State::Results { image, .. } => {
                Some(image)
            }
        }
    }

    pub fn items(&self) -> Option<&[IdentifiedItem]> {
        match &self.state {
            State::Results { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn selected_item(&self) -> Option<&IdentifiedItem> {
        match &self.state {
            State::Results { items, selected: Some(index), .. } => items.get(*index),
            _ => None,
        }
    }

    pub fn search_state(&self) -> Option<&SearchState> {
        match &self.state {
            State::Results { search, .. } => Some(search),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            State::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// 新しい画像をアップロード（どのフェーズからでも可）
    ///
    /// 以前のリソースは古い状態と一緒に破棄される。
    pub fn begin_upload(&mut self, image: H) -> AnalysisTicket {
        self.generation += 1;
        self.state = State::Loading { image };
        AnalysisTicket { generation: self.generation }
    }

    /// 抽出成功: Loading → Results
    ///
    /// アイテムがあれば先頭を選択状態にする（検索はまだ開始しない）。
    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        items: Vec<IdentifiedItem>,
    ) -> Result<Applied> {
        if ticket.generation != self.generation {
            return Ok(Applied::Stale);
        }
        let image = self.take_loading_image("complete an analysis")?;
        let selected = if items.is_empty() { None } else { Some(0) };
        self.state = State::Results {
            image,
            items,
            selected,
            search: SearchState::Idle,
            search_ticket: None,
        };
        Ok(Applied::Current)
    }

    /// 抽出失敗: Loading → Error
    pub fn fail_analysis(&mut self, ticket: AnalysisTicket, message: impl Into<String>) -> Result<Applied> {
        if ticket.generation != self.generation {
            return Ok(Applied::Stale);
        }
        let image = self.take_loading_image("fail an analysis")?;
        self.state = State::Error {
            image,
            message: message.into(),
        };
        Ok(Applied::Current)
    }

    /// アイテムを選択して検索を開始（Results のみ）
    pub fn select(&mut self, index: usize) -> Result<SearchRequest> {
        let generation = self.generation;
        let phase = self.phase();
        let State::Results { items, selected, search, search_ticket, .. } = &mut self.state else {
            return Err(Error::Transition { action: "select an item", phase: phase.as_str() });
        };
        let Some(item) = items.get(index) else {
            return Err(Error::Selection { index, len: items.len() });
        };

        let ticket = SearchTicket { generation, item_index: index };
        *selected = Some(index);
        *search = SearchState::Loading;
        *search_ticket = Some(ticket);

        Ok(SearchRequest {
            ticket,
            query: item.item_name.clone(),
        })
    }

    /// 現在選択中のアイテムで検索を開始
    pub fn search_selected(&mut self) -> Result<SearchRequest> {
        let index = match &self.state {
            State::Results { selected: Some(index), .. } => *index,
            _ => {
                return Err(Error::Transition {
                    action: "search without a selected item",
                    phase: self.phase().as_str(),
                })
            }
        };
        self.select(index)
    }

    /// 検索結果を適用
    ///
    /// チケットが現在の世代・選択と一致しない場合は破棄する。
    /// 外側のフェーズは変わらない。
    pub fn finish_search(
        &mut self,
        ticket: SearchTicket,
        outcome: std::result::Result<Vec<ShoppingSuggestion>, String>,
    ) -> Applied {
        let State::Results { search, search_ticket, .. } = &mut self.state else {
            return Applied::Stale;
        };
        if ticket.generation != self.generation || *search_ticket != Some(ticket) {
            return Applied::Stale;
        }

        *search = match outcome {
            Ok(suggestions) => SearchState::Ready(suggestions),
            Err(message) => SearchState::Failed(message),
        };
        Applied::Current
    }

    /// どのフェーズからでも Idle に戻る
    ///
    /// 実行中の抽出・検索の結果はこれ以降すべて Stale になる。
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = State::Idle;
    }

    fn take_loading_image(&mut self, action: &'static str) -> Result<H> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Loading { image } => Ok(image),
            other => {
                let phase = other.phase().as_str();
                self.state = other;
                Err(Error::Transition { action, phase })
            }
        }
    }
}
