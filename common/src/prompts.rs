//! プロンプト生成モジュール
//!
//! - OUTFIT_PROMPT: コーディネート解析用の固定指示文
//! - response_schema: Geminiの responseSchema に渡す出力スキーマ

use serde_json::{json, Value};

/// コーディネート解析プロンプト
pub const OUTFIT_PROMPT: &str = r#"You are "Wardrobe AI," a sophisticated fashion expert. Your task is to analyze the user-provided image and identify the distinct clothing items and accessories being worn.

For each item identified, you must:
1.  Provide a concise, descriptive name (e.g., "Black Leather Biker Jacket," "High-Waisted Light-Wash Jeans"). This name will be used as a search query.
2.  Categorize the item (e.g., "Outerwear," "Pants," "Footwear," "Accessory").
3.  Write a brief, appealing description of the item.

Respond ONLY with a valid JSON array that adheres to the provided schema. Do not include any markdown formatting like ```json.
"#;

/// 必須フィールド
pub const REQUIRED_FIELDS: &[&str] = &["itemName", "category", "description"];

/// 出力スキーマ（OpenAPIサブセット形式）
///
/// `itemName`, `category`, `description` の3つの文字列フィールドを
/// 必須とするオブジェクトの配列。
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "itemName": {
                    "type": "STRING",
                    "description": "Descriptive name of the clothing item to be used as a search query."
                },
                "category": {
                    "type": "STRING",
                    "description": "Category of the item (e.g., Outerwear, Footwear)."
                },
                "description": {
                    "type": "STRING",
                    "description": "A brief description of the item."
                }
            },
            "required": REQUIRED_FIELDS
        }
    })
}
