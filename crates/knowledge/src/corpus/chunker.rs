//! Sentence-greedy chunking on the Chinese full stop.

use crate::types::{Category, Chunk};

/// Sentence delimiter.
const FULL_STOP: char = '。';

/// Split one cleaned document into chunks.
///
/// Sentences are accumulated until the buffer holds at least `chunk_size`
/// characters, then emitted as `<name>_<n>` where `n` is `produced` plus the
/// chunks already emitted for this document. A non-empty remainder becomes
/// `<name>_last`.
pub fn chunk_document(
    name: &str,
    category: Category,
    cleaned: &str,
    chunk_size: usize,
    produced: usize,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for sentence in cleaned.split(FULL_STOP) {
        if sentence.trim().is_empty() {
            continue;
        }

        buffer.push_str(sentence);
        buffer.push(FULL_STOP);
        buffer_chars += sentence.chars().count() + 1;

        if buffer_chars >= chunk_size {
            chunks.push(Chunk {
                id: format!("{}_{}", name, produced + chunks.len()),
                name: name.to_string(),
                category,
                text: std::mem::take(&mut buffer),
            });
            buffer_chars = 0;
        }
    }

    if !buffer.is_empty() {
        chunks.push(Chunk {
            id: format!("{}_last", name),
            name: name.to_string(),
            category,
            text: buffer,
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_document_is_single_last_chunk() {
        let chunks = chunk_document("张三", Category::Person, "张三是明代官员。他主持了改革。", 150, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "张三_last");
        assert_eq!(chunks[0].text, "张三是明代官员。他主持了改革。");
    }

    #[test]
    fn test_emits_when_threshold_reached() {
        // Each sentence is 4 chars + full stop = 5 chars
        let text = "甲乙丙丁。戊己庚辛。壬癸子丑。寅卯辰巳。";
        let chunks = chunk_document("测试", Category::Person, text, 10, 0);

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["测试_0", "测试_1"]);
        assert_eq!(chunks[0].text, "甲乙丙丁。戊己庚辛。");
        assert_eq!(chunks[1].text, "壬癸子丑。寅卯辰巳。");
    }

    #[test]
    fn test_remainder_gets_last_suffix() {
        let text = "甲乙丙丁。戊己庚辛。壬癸";
        let chunks = chunk_document("测试", Category::EventInstitution, text, 10, 0);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].id, "测试_last");
        assert_eq!(chunks[1].text, "壬癸。");
        assert!(chunks.iter().all(|c| c.category == Category::EventInstitution));
    }

    #[test]
    fn test_ordinals_continue_from_global_count() {
        let text = "甲乙丙丁。戊己庚辛。";
        let chunks = chunk_document("李四", Category::Person, text, 5, 7);
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["李四_7", "李四_8"]);
    }

    #[test]
    fn test_whitespace_sentences_skipped() {
        let chunks = chunk_document("测试", Category::Person, "。 。甲乙。", 150, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "甲乙。");
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        assert!(chunk_document("空", Category::Person, "", 150, 0).is_empty());
    }

    #[test]
    fn test_character_count_not_bytes() {
        // 3 CJK chars + full stop = 4 chars but 12 bytes
        let chunks = chunk_document("测试", Category::Person, "一二三。", 5, 0);
        assert_eq!(chunks[0].id, "测试_last");
    }
}
