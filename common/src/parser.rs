//! APIレスポンスパーサー
//!
//! Geminiの応答テキストからMarkdownの装飾を取り除き、
//! IdentifiedItem の配列としてパースする

use crate::error::{Error, Result};
use crate::types::IdentifiedItem;

/// Markdownのコードフェンスを取り除く
///
/// 対応する形式:
/// 1. ```json ... ``` ブロック
/// 2. 言語指定なしの ``` ... ``` ブロック
/// 3. フェンスなし（前後の空白のみ除去）
///
/// # Examples
/// ```
/// use outfit_ai_common::strip_code_fence;
///
/// let fenced = "```json\n[]\n```";
/// assert_eq!(strip_code_fence(fenced), "[]");
/// assert_eq!(strip_code_fence("  []  "), "[]");
/// ```
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // 開始フェンスの行末（言語タグ）を読み飛ばす
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches("json"),
    };

    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// 抽出レスポンスをパース
///
/// スキーマに合わない応答（JSONでない、配列でない、必須フィールドの欠落、
/// 型違い、空の itemName）はすべて `Error::Parse` になり、
/// 部分的に埋まったアイテムは返さない。空配列は正常な結果。
///
/// # Arguments
/// * `response` - モデルの応答テキスト
pub fn parse_items_response(response: &str) -> Result<Vec<IdentifiedItem>> {
    let json_str = strip_code_fence(response);
    if json_str.is_empty() {
        return Err(Error::Parse("empty response".into()));
    }

    let items: Vec<IdentifiedItem> = serde_json::from_str(json_str)
        .map_err(|e| Error::Parse(format!("response does not match item schema: {}", e)))?;

    if let Some(index) = items.iter().position(|item| item.item_name.trim().is_empty()) {
        return Err(Error::Parse(format!("item {} has an empty itemName", index)));
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================
    // strip_code_fence テスト
    // =============================================

    #[test]
    fn test_strip_json_fence() {
        let response = "```json\n[{\"itemName\": \"Scarf\"}]\n```";
        assert_eq!(strip_code_fence(response), "[{\"itemName\": \"Scarf\"}]");
    }

    #[test]
    fn test_strip_plain_fence() {
        let response = "```\n[]\n```\n";
        assert_eq!(strip_code_fence(response), "[]");
    }

    #[test]
    fn test_strip_no_fence() {
        let response = "\n  [1, 2]  \n";
        assert_eq!(strip_code_fence(response), "[1, 2]");
    }

    #[test]
    fn test_strip_unterminated_fence() {
        let response = "```json\n[]";
        assert_eq!(strip_code_fence(response), "[]");
    }

    // =============================================
    // parse_items_response テスト
    // =============================================

    #[test]
    fn test_parse_items_verbatim() {
        let response = r#"[
  {"itemName": "Black Biker Jacket", "category": "Outerwear", "description": "Leather, cropped."},
  {"itemName": "White Sneakers", "category": "Footwear", "description": "Low-top canvas."}
]"#;

        let items = parse_items_response(response).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_name, "Black Biker Jacket");
        assert_eq!(items[0].category, "Outerwear");
        assert_eq!(items[0].description, "Leather, cropped.");
        assert_eq!(items[1].item_name, "White Sneakers");
    }

    #[test]
    fn test_parse_items_fenced() {
        let response = "```json\n[{\"itemName\": \"Beret\", \"category\": \"Accessory\", \"description\": \"Red wool.\"}]\n```";

        let items = parse_items_response(response).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_name, "Beret");
    }

    #[test]
    fn test_parse_items_empty_array() {
        let items = parse_items_response("[]").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_parse_items_not_json() {
        let result = parse_items_response("I could not find any clothing.");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_items_missing_field() {
        let response = r#"[
  {"itemName": "Jeans", "category": "Pants", "description": "Light wash."},
  {"itemName": "Belt", "category": "Accessory"}
]"#;

        let result = parse_items_response(response);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_items_wrong_type() {
        let response = r#"[{"itemName": 42, "category": "Pants", "description": "x"}]"#;
        assert!(parse_items_response(response).is_err());
    }

    #[test]
    fn test_parse_items_object_instead_of_array() {
        let response = r#"{"itemName": "Coat", "category": "Outerwear", "description": "Camel."}"#;
        assert!(parse_items_response(response).is_err());
    }

    #[test]
    fn test_parse_items_empty_item_name() {
        let response = r#"[{"itemName": "  ", "category": "Pants", "description": "x"}]"#;

        let result = parse_items_response(response);
        if let Err(Error::Parse(msg)) = result {
            assert!(msg.contains("itemName"));
        } else {
            panic!("Expected Parse error");
        }
    }

    #[test]
    fn test_parse_items_empty_response() {
        assert!(parse_items_response("   ").is_err());
    }
}
