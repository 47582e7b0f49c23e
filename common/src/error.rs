//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    /// 存在しないアイテムを選択した
    #[error("No item #{index} to select ({len} items identified)")]
    Selection { index: usize, len: usize },

    /// 現在のフェーズでは許可されない状態遷移
    #[error("Invalid transition: cannot {action} while {phase}")]
    Transition {
        action: &'static str,
        phase: &'static str,
    },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
