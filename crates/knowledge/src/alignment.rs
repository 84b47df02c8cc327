//! Institutional alignment check.
//!
//! Scores a text by how much Ming institutional vocabulary it uses. The
//! score is a coarse plausibility signal for retrieved or generated
//! passages, not a classifier.

use serde::{Deserialize, Serialize};

/// Institutional vocabulary, in reporting order.
pub const INSTITUTION_KEYWORDS: [&str; 20] = [
    "卫所", "锦衣卫", "东厂", "西厂", "内阁", "科举", "六部", "巡抚", "总督", "里甲",
    "黄册", "鱼鳞图册", "海禁", "朝贡", "司礼监", "翰林院", "国子监", "布政使", "按察使",
    "都指挥使",
];

/// Score contributed by each keyword found.
const KEYWORD_WEIGHT: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alignment {
    pub is_valid: bool,

    /// `min(0.2 * found, 1.0)`
    pub score: f32,

    /// Keywords present in the text, in vocabulary order
    pub keywords: Vec<String>,
}

/// Check `text` against the institutional vocabulary.
pub fn validate(text: &str) -> Alignment {
    let keywords: Vec<String> = INSTITUTION_KEYWORDS
        .iter()
        .filter(|kw| text.contains(*kw))
        .map(|kw| kw.to_string())
        .collect();

    let score = (keywords.len() as f32 * KEYWORD_WEIGHT).min(1.0);

    Alignment {
        is_valid: !keywords.is_empty(),
        score,
        keywords,
    }
}
