//! Entity consistency audit for generated text.

use crate::keywords::KeywordExtractor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Pass,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub status: AuditStatus,
    pub message: String,
    pub passed: bool,

    /// Query keywords absent from the generated text
    pub missing: Vec<String>,
}

/// Check that every content word of `query` appears in `generated`.
pub fn audit(extractor: &KeywordExtractor, query: &str, generated: &str) -> AuditReport {
    let missing: Vec<String> = extractor
        .audit_keywords(query)
        .into_iter()
        .filter(|kw| !generated.contains(kw.as_str()))
        .collect();

    if missing.is_empty() {
        return AuditReport {
            status: AuditStatus::Pass,
            message: "Content entity consistency check passed".to_string(),
            passed: true,
            missing,
        };
    }

    tracing::debug!("Audit missing entities: {:?}", missing);
    AuditReport {
        status: AuditStatus::Warning,
        message: format!(
            "Generated content may not fully cover entities in instruction: {}",
            missing.join(", ")
        ),
        passed: false,
        missing,
    }
}
