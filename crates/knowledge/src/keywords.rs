//! Query keyword extraction.
//!
//! Segments Chinese text with jieba and keeps the content words: at least
//! two characters long and not a hypothetical or stance marker.

use jieba_rs::Jieba;

/// Words dropped before auditing generated text.
pub const AUDIT_STOP_WORDS: [&str; 8] = [
    "假如", "如果", "支持", "反对", "彻底", "清算", "对于", "关于",
];

/// Words dropped before asking the model to mention keywords.
pub const PROMPT_STOP_WORDS: [&str; 10] = [
    "假如", "如果", "支持", "反对", "彻底", "清算", "对于", "关于", "是否", "可以",
];

/// Jieba segmenter with the default dictionary.
///
/// Loading the dictionary is not free; build one extractor and share it.
pub struct KeywordExtractor {
    jieba: Jieba,
}

impl std::fmt::Debug for KeywordExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordExtractor").finish_non_exhaustive()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }

    /// Content words of `text` in order of first appearance, duplicates
    /// removed.
    pub fn extract(&self, text: &str, stop_words: &[&str]) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();

        for word in self.jieba.cut(text, true) {
            let word = word.trim();
            if word.chars().count() < 2 || stop_words.contains(&word) {
                continue;
            }
            if !keywords.iter().any(|k| k == word) {
                keywords.push(word.to_string());
            }
        }

        keywords
    }

    /// Keywords the auditor expects to find in generated text.
    pub fn audit_keywords(&self, query: &str) -> Vec<String> {
        self.extract(query, &AUDIT_STOP_WORDS)
    }

    /// Keywords the generation prompt asks the model to include.
    pub fn prompt_keywords(&self, query: &str) -> Vec<String> {
        self.extract(query, &PROMPT_STOP_WORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_words_removed() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.audit_keywords("假如改革");
        assert!(!keywords.iter().any(|k| k == "假如"));
        assert!(keywords.iter().any(|k| k == "改革"));
    }

    #[test]
    fn test_single_characters_dropped() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract("我 的 改革", &[]);
        assert!(keywords.iter().all(|k| k.chars().count() >= 2));
    }

    #[test]
    fn test_prompt_list_is_stricter() {
        let extractor = KeywordExtractor::new();
        let audit = extractor.extract("是否可以", &AUDIT_STOP_WORDS);
        let prompt = extractor.prompt_keywords("是否可以");
        assert!(prompt.len() <= audit.len());
        assert!(!prompt.iter().any(|k| k == "是否" || k == "可以"));
    }

    #[test]
    fn test_duplicates_collapsed() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract("改革 改革 改革", &[]);
        assert_eq!(keywords, vec!["改革".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        let extractor = KeywordExtractor::new();
        assert!(extractor.audit_keywords("").is_empty());
    }
}
