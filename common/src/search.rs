//! 画像検索レスポンスの変換
//!
//! Google Custom Search（画像モード）の生レスポンスを ShoppingSuggestion に変換する。
//! 画像URLまたは商品ページURLが欠けたエントリは必ず除外する。

use crate::types::ShoppingSuggestion;
use serde::Deserialize;

/// 検索APIのレスポンス
///
/// `items` が存在しない場合は結果0件として扱う
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<RawSearchItem>,
}

/// 検索結果1件（プロバイダ定義の形）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchItem {
    #[serde(default)]
    pub title: Option<String>,
    /// 画像検索では画像そのもののURL
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image: Option<RawImageInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImageInfo {
    /// 画像が掲載されているページ
    #[serde(default)]
    pub context_link: Option<String>,
}

impl RawSearchItem {
    /// 表示用の候補に変換（URLフィールドが無ければ None、空文字は後段で除外）
    pub fn into_suggestion(self) -> Option<ShoppingSuggestion> {
        let image_url = self.link?;
        let product_page_url = self.image.and_then(|i| i.context_link)?;
        Some(ShoppingSuggestion {
            name: self.title.unwrap_or_default(),
            image_url,
            product_page_url,
        })
    }
}

/// 生の検索結果を候補リストに変換
///
/// 元の並び順を保ったまま、不完全なエントリを除外する
pub fn collect_suggestions(items: Vec<RawSearchItem>) -> Vec<ShoppingSuggestion> {
    retain_complete(items.into_iter().filter_map(RawSearchItem::into_suggestion).collect())
}

/// 不完全な候補を除外（何度適用しても結果は同じ）
pub fn retain_complete(mut suggestions: Vec<ShoppingSuggestion>) -> Vec<ShoppingSuggestion> {
    suggestions.retain(ShoppingSuggestion::is_complete);
    suggestions
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: Option<ProviderError>,
}

#[derive(Deserialize)]
struct ProviderError {
    message: Option<String>,
}

/// エラーレスポンスからメッセージを取り出す
///
/// `{"error": {"message": "..."}}` 形式ならその message を、
/// パースできなければステータスコードの汎用メッセージを返す
pub fn provider_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Google API responded with status: {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SearchResponse {
        serde_json::from_str(json).expect("デシリアライズ失敗")
    }

    // =============================================
    // collect_suggestions テスト
    // =============================================

    #[test]
    fn test_collect_maps_fields() {
        let response = parse(r#"{
            "items": [{
                "title": "Leather Moto Jacket",
                "link": "https://img.example.com/jacket.jpg",
                "image": {"contextLink": "https://shop.example.com/jacket"}
            }]
        }"#);

        let suggestions = collect_suggestions(response.items);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name, "Leather Moto Jacket");
        assert_eq!(suggestions[0].image_url, "https://img.example.com/jacket.jpg");
        assert_eq!(suggestions[0].product_page_url, "https://shop.example.com/jacket");
    }

    #[test]
    fn test_collect_drops_incomplete() {
        let response = parse(r#"{
            "items": [
                {"title": "ok", "link": "https://a/1.jpg", "image": {"contextLink": "https://a/1"}},
                {"title": "no page", "link": "https://a/2.jpg", "image": {}},
                {"title": "no image block", "link": "https://a/3.jpg"},
                {"title": "no link", "image": {"contextLink": "https://a/4"}},
                {"title": "empty link", "link": "", "image": {"contextLink": "https://a/5"}}
            ]
        }"#);

        let suggestions = collect_suggestions(response.items);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name, "ok");
    }

    #[test]
    fn test_collect_keeps_order() {
        let response = parse(r#"{
            "items": [
                {"title": "first", "link": "https://a/1.jpg", "image": {"contextLink": "https://a/1"}},
                {"title": "second", "link": "https://a/2.jpg", "image": {"contextLink": "https://a/2"}}
            ]
        }"#);

        let names: Vec<String> = collect_suggestions(response.items)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_missing_title_becomes_empty_name() {
        let response = parse(r#"{"items": [{"link": "https://a/1.jpg", "image": {"contextLink": "https://a/1"}}]}"#);

        let suggestions = collect_suggestions(response.items);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name, "");
    }

    #[test]
    fn test_absent_items_is_empty() {
        let response = parse(r#"{"kind": "customsearch#search", "searchInformation": {"totalResults": "0"}}"#);
        assert!(collect_suggestions(response.items).is_empty());
    }

    #[test]
    fn test_all_filtered_is_empty() {
        let response = parse(r#"{"items": [{"title": "x"}, {"link": "https://a/1.jpg"}]}"#);
        assert!(collect_suggestions(response.items).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let response = parse(r#"{
            "items": [
                {"title": "a", "link": "https://a/1.jpg", "image": {"contextLink": "https://a/1"}},
                {"title": "b", "link": "https://a/2.jpg"},
                {"title": "c", "link": "https://a/3.jpg", "image": {"contextLink": "https://a/3"}}
            ]
        }"#);

        let once = collect_suggestions(response.items);
        let twice = retain_complete(once.clone());
        assert_eq!(once, twice);
        assert_eq!(twice.len(), 2);
    }

    #[test]
    fn test_retain_complete_drops_blank_urls() {
        let suggestions = vec![
            ShoppingSuggestion {
                name: "kept".into(),
                image_url: "https://a/1.jpg".into(),
                product_page_url: "https://a/1".into(),
            },
            ShoppingSuggestion {
                name: "dropped".into(),
                image_url: "https://a/2.jpg".into(),
                product_page_url: String::new(),
            },
        ];

        let kept = retain_complete(suggestions);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "kept");
    }

    // =============================================
    // provider_error_message テスト
    // =============================================

    #[test]
    fn test_provider_error_message_from_body() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded"}}"#;
        assert_eq!(provider_error_message(429, body), "Quota exceeded");
    }

    #[test]
    fn test_provider_error_message_not_json() {
        assert_eq!(
            provider_error_message(502, "<html>Bad Gateway</html>"),
            "Google API responded with status: 502"
        );
    }

    #[test]
    fn test_provider_error_message_without_message() {
        assert_eq!(
            provider_error_message(403, r#"{"error": {"code": 403}}"#),
            "Google API responded with status: 403"
        );
    }
}
