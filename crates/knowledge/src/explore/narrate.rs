//! Counterfactual narration and biography enrichment.
//!
//! Both steps talk to external services. Their failures are reported as
//! [`Enrichment::Unavailable`] and never abort an exploration.

use crate::alignment;
use crate::audit::audit;
use crate::biography::{Biography, BiographyClient};
use crate::explore::types::{Enrichment, Exploration, Narrative};
use crate::keywords::KeywordExtractor;
use mingyu_llm::{LlmClient, LlmRequest};
use mingyu_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;

/// Reason reported when no generation client could be configured.
pub const NO_CLIENT_REASON: &str = "API key not configured, cannot generate text";

/// Settings for one narration call.
#[derive(Debug, Clone)]
pub struct NarrationSettings<'a> {
    pub prompt: &'a PromptDefinition,
    pub model: &'a str,

    /// Neighbor texts passed as historical context
    pub context_neighbors: usize,
}

/// Template variables for the narrative prompt.
pub fn prompt_variables(
    exploration: &Exploration,
    keywords: &KeywordExtractor,
    context_neighbors: usize,
) -> HashMap<String, String> {
    let context = exploration
        .neighbors
        .iter()
        .take(context_neighbors)
        .map(|n| format!("- {}", n.chunk.text))
        .collect::<Vec<_>>()
        .join("\n");

    HashMap::from([
        ("query".to_string(), exploration.query.clone()),
        ("fact".to_string(), exploration.anchor.chunk.text.clone()),
        ("context".to_string(), context),
        ("alpha".to_string(), exploration.alpha.to_string()),
        (
            "keywords".to_string(),
            keywords.prompt_keywords(&exploration.query).join(", "),
        ),
    ])
}

/// Generate pseudo-history for an exploration, then audit it.
pub async fn narrate(
    exploration: &Exploration,
    client: Option<&dyn LlmClient>,
    keywords: &KeywordExtractor,
    settings: &NarrationSettings<'_>,
) -> Enrichment<Narrative> {
    let Some(client) = client else {
        return Enrichment::unavailable(NO_CLIENT_REASON);
    };

    let variables = prompt_variables(exploration, keywords, settings.context_neighbors);
    let built = match build_prompt(settings.prompt, variables) {
        Ok(built) => built,
        Err(e) => {
            tracing::warn!("Failed to build narrative prompt: {}", e);
            return Enrichment::unavailable(e.to_string());
        }
    };

    let mut request = LlmRequest::new(built.user, settings.model)
        .with_temperature(built.temperature)
        .with_top_p(built.top_p);
    if let Some(system) = built.system {
        request = request.with_system(system);
    }

    tracing::debug!(
        "Requesting narration from '{}' (model: {})",
        client.provider_name(),
        settings.model
    );

    let response = match client.complete(&request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Generation failed: {}", e);
            return Enrichment::unavailable(format!("Generation failed: {}", e));
        }
    };

    let text = response.content.trim().to_string();
    if text.is_empty() {
        return Enrichment::unavailable("Generation returned no text");
    }

    let audit = audit(keywords, &exploration.query, &text);
    let alignment = alignment::validate(&text);

    tracing::info!(
        "Narration audited: {:?}, alignment score {:.1}",
        audit.status,
        alignment.score
    );

    Enrichment::Available {
        value: Narrative {
            text,
            model: response.model,
            audit,
            alignment,
        },
    }
}

/// Look up the best match's biography when the exploration qualifies.
pub async fn enrich_biography(
    exploration: &Exploration,
    client: Option<&BiographyClient>,
) -> Enrichment<Biography> {
    let Some(name) = exploration.biography_candidate() else {
        return Enrichment::Skipped;
    };

    let Some(client) = client else {
        return Enrichment::unavailable("Biography lookup disabled");
    };

    match client.lookup(name).await {
        Some(bio) => Enrichment::Available { value: bio },
        None => Enrichment::unavailable(format!("No CBDB record for {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditStatus;
    use crate::types::{Category, Chunk, ScoredChunk};
    use async_trait::async_trait;
    use mingyu_core::{AppError, AppResult};
    use mingyu_llm::{LlmResponse, LlmUsage};
    use mingyu_prompt::{builtin_prompt, NARRATIVE_PROMPT_ID};
    use std::sync::Mutex;

    struct StubClient {
        reply: AppResult<String>,
        seen: Mutex<Vec<LlmRequest>>,
    }

    impl StubClient {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(AppError::Llm("HTTP 401: invalid api key".to_string())),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for StubClient {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::new(10, 20),
                }),
                Err(e) => Err(AppError::Llm(e.to_string())),
            }
        }
    }

    fn scored(id: &str, name: &str, category: Category, text: &str) -> ScoredChunk {
        ScoredChunk {
            score: 0.5,
            position: 0,
            chunk: Chunk {
                id: id.to_string(),
                name: name.to_string(),
                category,
                text: text.to_string(),
            },
        }
    }

    fn exploration(best: ScoredChunk) -> Exploration {
        let best_match_alignment = Some(alignment::validate(&best.chunk.text));
        Exploration {
            query: "假如张居正改革".to_string(),
            alpha: 0.3,
            anchor: scored("张居正_0", "张居正", Category::Person, "张居正推行一条鞭法。"),
            neighbors: vec![
                best,
                scored("海瑞_1", "海瑞", Category::Person, "海瑞巡抚应天。"),
                scored("徐阶_2", "徐阶", Category::Person, "徐阶入内阁。"),
                scored("严嵩_3", "严嵩", Category::Person, "严嵩专权。"),
            ],
            best_match_alignment,
            degenerate: false,
            query_vector: Vec::new(),
            fact_vector: Vec::new(),
            gen_vector: Vec::new(),
        }
    }

    fn settings(prompt: &PromptDefinition) -> NarrationSettings<'_> {
        NarrationSettings {
            prompt,
            model: "qwen-plus",
            context_neighbors: 3,
        }
    }

    #[test]
    fn test_prompt_variables() {
        let keywords = KeywordExtractor::new();
        let exp = exploration(scored("高拱_4", "高拱", Category::Person, "高拱掌吏部。"));
        let vars = prompt_variables(&exp, &keywords, 3);

        assert_eq!(vars["fact"], "张居正推行一条鞭法。");
        assert_eq!(vars["alpha"], "0.3");
        assert_eq!(vars["context"], "- 高拱掌吏部。\n- 海瑞巡抚应天。\n- 徐阶入内阁。");
        assert!(!vars["keywords"].contains("假如"));
    }

    #[tokio::test]
    async fn test_narrate_available_and_audited() {
        let prompt = builtin_prompt(NARRATIVE_PROMPT_ID).unwrap().unwrap();
        let keywords = KeywordExtractor::new();
        let client = StubClient::replying("万历初，张居正以内阁首辅主持改革，清丈田亩。");
        let exp = exploration(scored("高拱_4", "高拱", Category::Person, "高拱掌吏部。"));

        let result = narrate(&exp, Some(&client as &dyn LlmClient), &keywords, &settings(&prompt)).await;
        let narrative = result.value().unwrap();

        assert_eq!(narrative.audit.status, AuditStatus::Pass);
        assert_eq!(narrative.alignment.keywords, vec!["内阁"]);
        assert_eq!(narrative.model, "qwen-plus");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].prompt.contains("假如张居正改革"));
        assert!(seen[0].prompt.contains("- 高拱掌吏部。"));
        assert!(!seen[0].prompt.contains("严嵩专权"));
        assert_eq!(seen[0].temperature, Some(0.7));
        assert!(seen[0].system.is_some());
    }

    #[tokio::test]
    async fn test_narrate_without_client_is_unavailable() {
        let prompt = builtin_prompt(NARRATIVE_PROMPT_ID).unwrap().unwrap();
        let keywords = KeywordExtractor::new();
        let exp = exploration(scored("高拱_4", "高拱", Category::Person, "高拱掌吏部。"));

        let result = narrate(&exp, None, &keywords, &settings(&prompt)).await;
        assert!(matches!(
            result,
            Enrichment::Unavailable { ref reason } if reason == NO_CLIENT_REASON
        ));
    }

    #[tokio::test]
    async fn test_narrate_failure_is_unavailable() {
        let prompt = builtin_prompt(NARRATIVE_PROMPT_ID).unwrap().unwrap();
        let keywords = KeywordExtractor::new();
        let client = StubClient::failing();
        let exp = exploration(scored("高拱_4", "高拱", Category::Person, "高拱掌吏部。"));

        let result = narrate(&exp, Some(&client as &dyn LlmClient), &keywords, &settings(&prompt)).await;
        match result {
            Enrichment::Unavailable { reason } => assert!(reason.contains("401")),
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_biography_gating() {
        // No institutional vocabulary: skipped
        let plain = exploration(scored("高拱_4", "高拱", Category::Person, "高拱掌吏部。"));
        assert!(plain.biography_candidate().is_none());
        assert!(matches!(
            enrich_biography(&plain, None).await,
            Enrichment::Skipped
        ));

        // Aligned but not a person: skipped
        let event = exploration(scored(
            "土木堡之变_0",
            "土木堡之变",
            Category::EventInstitution,
            "锦衣卫随驾。",
        ));
        assert!(event.biography_candidate().is_none());

        // Aligned person with an unknown name: skipped
        let unknown = exploration(scored("未知_0", "未知", Category::Person, "锦衣卫。"));
        assert!(unknown.biography_candidate().is_none());

        // Aligned person: candidate, but the lookup is disabled
        let person = exploration(scored("于谦_0", "于谦", Category::Person, "于谦任巡抚。"));
        assert_eq!(person.biography_candidate(), Some("于谦"));
        assert!(matches!(
            enrich_biography(&person, None).await,
            Enrichment::Unavailable { .. }
        ));
    }
}
