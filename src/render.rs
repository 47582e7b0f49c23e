//! 端末表示用の整形

use outfit_ai_common::{IdentifiedItem, SearchState, ShoppingSuggestion};
use std::fmt::Write;

pub const NO_ITEMS_MESSAGE: &str = "No items could be identified in this photo.";
pub const NO_SUGGESTIONS_MESSAGE: &str = "We couldn't find any similar items. Try another outfit!";

/// 識別アイテム一覧（選択中のアイテムに印を付ける）
pub fn render_items(items: &[IdentifiedItem], selected: Option<&IdentifiedItem>) -> String {
    if items.is_empty() {
        return format!("{}\n", NO_ITEMS_MESSAGE);
    }

    let mut out = String::from("Identified Items\n");
    for (i, item) in items.iter().enumerate() {
        let marker = if selected == Some(item) { "▶" } else { " " };
        let _ = writeln!(out, "{} {:>2}. {} [{}]", marker, i + 1, item.item_name, item.category);
        let _ = writeln!(out, "       {}", item.description);
    }
    out
}

/// 類似商品一覧
pub fn render_suggestions(suggestions: &[ShoppingSuggestion]) -> String {
    if suggestions.is_empty() {
        return format!("{}\n", NO_SUGGESTIONS_MESSAGE);
    }

    let mut out = String::new();
    for (i, s) in suggestions.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {}", i + 1, s.name);
        let _ = writeln!(out, "    画像: {}", s.image_url);
        let _ = writeln!(out, "    商品: {}", s.product_page_url);
    }
    out
}

/// 選択中アイテムの検索状態
pub fn render_search(item: &IdentifiedItem, state: &SearchState) -> String {
    let header = format!("Shop the Look: {}\n", item.item_name);
    match state {
        SearchState::Idle => header,
        SearchState::Loading => format!("{}Searching...\n", header),
        SearchState::Ready(suggestions) => format!("{}{}", header, render_suggestions(suggestions)),
        SearchState::Failed(message) => format!("{}⚠ {}\n", header, message),
    }
}
