//! Hashed character n-gram embeddings.
//!
//! Chinese has no word delimiters, so features are single characters and
//! adjacent character pairs, hashed into a fixed number of buckets. Local,
//! offline and fully deterministic.

use crate::embeddings::normalize_in_place;
use crate::embeddings::provider::EmbeddingProvider;
use mingyu_core::AppResult;

/// Full-width punctuation that carries no topical signal.
const CJK_PUNCTUATION: &[char] = &[
    '。', '，', '、', '；', '：', '？', '！', '“', '”', '‘', '’', '（', '）', '《', '》', '【',
    '】', '「', '」', '—', '…', '·', '～',
];

/// Weight of a bigram relative to a unigram.
const BIGRAM_WEIGHT: f32 = 1.5;

#[derive(Debug)]
pub struct NgramProvider {
    dimensions: usize,
    model: String,
}

impl NgramProvider {
    pub fn new(dimensions: usize, model: impl Into<String>) -> Self {
        Self {
            dimensions,
            model: model.into(),
        }
    }

    fn bucket(&self, gram: &str, seed: u64) -> usize {
        let hash = gram
            .bytes()
            .fold(seed, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let chars: Vec<char> = text.chars().filter(|c| is_feature_char(*c)).collect();

        let mut gram = String::with_capacity(8);
        for c in &chars {
            gram.clear();
            gram.push(*c);
            embedding[self.bucket(&gram, 17)] += 1.0;
        }

        for pair in chars.windows(2) {
            gram.clear();
            gram.push(pair[0]);
            gram.push(pair[1]);
            embedding[self.bucket(&gram, 29)] += BIGRAM_WEIGHT;
        }

        normalize_in_place(&mut embedding);
        embedding
    }
}

fn is_feature_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_ascii_punctuation() && !CJK_PUNCTUATION.contains(&c)
}

#[async_trait::async_trait]
impl EmbeddingProvider for NgramProvider {
    fn provider_name(&self) -> &str {
        "ngram"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_embedding(text))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{dot, l2_norm};

    fn provider() -> NgramProvider {
        NgramProvider::new(512, "ngram-v1")
    }

    #[tokio::test]
    async fn test_unit_norm() {
        let embedding = provider().embed("张居正推行一条鞭法。").await.unwrap();
        assert_eq!(embedding.len(), 512);
        assert!((l2_norm(&embedding) - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let p = provider();
        let a = p.embed("戚继光抗倭").await.unwrap();
        let b = p.embed("戚继光抗倭").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_punctuation_and_whitespace_ignored() {
        let p = provider();
        let a = p.embed("海瑞 罢官").await.unwrap();
        let b = p.embed("海瑞，罢官。").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedding = provider().embed("。 ，").await.unwrap();
        assert_eq!(embedding.len(), 512);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_shared_characters_score_higher() {
        let p = provider();
        let query = p.embed("张居正改革").await.unwrap();
        let related = p.embed("张居正主持万历新政改革").await.unwrap();
        let unrelated = p.embed("郑和率船队下西洋").await.unwrap();

        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let p = provider();
        let texts = vec!["于谦".to_string(), "徐阶".to_string()];
        let batch = p.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[0], p.embed("于谦").await.unwrap());
        assert_eq!(batch[1], p.embed("徐阶").await.unwrap());
    }
}
