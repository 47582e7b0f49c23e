//! 解析結果の型定義
//!
//! - IdentifiedItem: 画像から識別された衣類・小物（抽出結果）
//! - ShoppingSuggestion: 類似商品の検索結果1件

use serde::{Deserialize, Serialize};

/// 写真から識別されたアイテム
///
/// フィールドはすべて必須。欠けている場合はデシリアライズ自体が失敗する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedItem {
    /// 表示名（検索クエリとしてそのまま使用）
    pub item_name: String,
    /// 大分類（Outerwear, Footwear など）
    pub category: String,
    /// 短い説明文
    pub description: String,
}

/// 類似商品の候補
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingSuggestion {
    pub name: String,
    pub image_url: String,
    pub product_page_url: String,
}

impl ShoppingSuggestion {
    /// 画像URLと商品ページURLが両方そろっているか
    pub fn is_complete(&self) -> bool {
        !self.image_url.trim().is_empty() && !self.product_page_url.trim().is_empty()
    }
}
