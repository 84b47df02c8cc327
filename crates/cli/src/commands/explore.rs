//! Explore command handler.
//!
//! Anchors a counterfactual query in the corpus, interpolates toward it and
//! narrates the result. Generation and biography lookup are optional
//! enrichments; their failure never fails the command.

use crate::commands::{generation_client, print_json, snippet};
use clap::Args;
use mingyu_core::{config::AppConfig, AppResult};
use mingyu_knowledge::biography::{Biography, BiographyClient};
use mingyu_knowledge::explore::{enrich_biography, narrate, NarrationSettings};
use mingyu_knowledge::projection::{exploration_points, project, ProjectedPoint};
use mingyu_knowledge::{Enrichment, Exploration, ExplorationReport, HistoryEngine, Narrative};
use mingyu_prompt::{resolve_prompt, NARRATIVE_PROMPT_ID};
use serde::Serialize;
use std::time::Duration;

const SNIPPET_CHARS: usize = 60;

/// Explore a counterfactual ("假如…")
#[derive(Args, Debug)]
pub struct ExploreCommand {
    /// Hypothetical query
    pub query: String,

    /// Fiction coefficient: 0 stays on the record, 1 follows the query
    #[arg(short, long)]
    pub alpha: Option<f32>,

    /// Neighbors retrieved around the interpolated vector
    #[arg(short, long)]
    pub neighbors: Option<usize>,

    /// Knowledge base name (default: retrieval.base from config)
    #[arg(short, long)]
    pub base: Option<String>,

    /// Skip text generation
    #[arg(long)]
    pub no_generate: bool,

    /// Skip the CBDB biography lookup
    #[arg(long)]
    pub no_biography: bool,

    /// Include a 2-D projection of the semantic neighborhood
    #[arg(long)]
    pub plot: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExploreOutput {
    #[serde(flatten)]
    report: ExplorationReport,

    #[serde(skip_serializing_if = "Option::is_none")]
    projection: Option<Vec<ProjectedPoint>>,
}

impl ExploreCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;

        let base = self.base.as_deref().unwrap_or(&config.retrieval.base);
        let alpha = self.alpha.unwrap_or(config.retrieval.alpha);
        let neighbor_count = self.neighbors.unwrap_or(config.retrieval.neighbor_count);
        tracing::info!("Executing explore command on base '{}'", base);

        let engine = mingyu_knowledge::open_engine(&config.workspace, base)?;
        let exploration = engine.explore(&self.query, alpha, neighbor_count).await?;

        let narrative = if self.no_generate {
            Enrichment::Skipped
        } else {
            narrative_enrichment(config, &engine, &exploration).await
        };

        let biography = if self.no_biography || !config.biography.enabled {
            Enrichment::Skipped
        } else {
            biography_enrichment(config, &exploration).await
        };

        let projection = if self.plot {
            Some(self.projection(&engine, &exploration)?)
        } else {
            None
        };

        let output = ExploreOutput {
            report: ExplorationReport {
                exploration,
                narrative,
                biography,
            },
            projection,
        };

        if self.json {
            print_json(&output)
        } else {
            print_report(&output);
            Ok(())
        }
    }

    fn projection(
        &self,
        engine: &HistoryEngine,
        exploration: &Exploration,
    ) -> AppResult<Vec<ProjectedPoint>> {
        let points = exploration_points(
            engine.index(),
            &exploration.fact_vector,
            &exploration.query_vector,
            &exploration.gen_vector,
        );
        project(&points)
    }
}

/// Generated narrative; a broken prompt or provider only marks it unavailable.
async fn narrative_enrichment(
    config: &AppConfig,
    engine: &HistoryEngine,
    exploration: &Exploration,
) -> Enrichment<Narrative> {
    let prompt = match resolve_prompt(&config.workspace, NARRATIVE_PROMPT_ID) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::warn!("Narrative prompt unavailable: {}", e);
            return Enrichment::unavailable(e.to_string());
        }
    };

    let client = generation_client(config);
    let settings = NarrationSettings {
        prompt: &prompt,
        model: &config.model,
        context_neighbors: config.retrieval.context_neighbors,
    };
    narrate(exploration, client.as_deref(), engine.keywords(), &settings).await
}

async fn biography_enrichment(config: &AppConfig, exploration: &Exploration) -> Enrichment<Biography> {
    match BiographyClient::new(
        config.biography.endpoint.clone(),
        Duration::from_secs(config.biography.timeout),
    ) {
        Ok(client) => enrich_biography(exploration, Some(&client)).await,
        Err(e) => {
            tracing::warn!("Biography client unavailable: {}", e);
            Enrichment::unavailable(e.to_string())
        }
    }
}

fn print_report(output: &ExploreOutput) {
    let report = &output.report;
    let exploration = &report.exploration;

    println!("Query: {}  (alpha = {})", exploration.query, exploration.alpha);
    println!(
        "Anchor: {} [{:.4}]",
        exploration.anchor.chunk.id, exploration.anchor.score
    );
    println!("   {}", snippet(&exploration.anchor.chunk.text, SNIPPET_CHARS));
    if exploration.degenerate {
        println!("Warning: the interpolated vector is degenerate");
    }

    println!();
    if exploration.neighbors.is_empty() {
        println!("Neighbors: (none)");
    } else {
        println!("Neighbors:");
        for (rank, n) in exploration.neighbors.iter().enumerate() {
            println!(
                "{:>3}. [{:.4}] {} ({})",
                rank + 1,
                n.score,
                n.chunk.id,
                n.chunk.category
            );
        }
    }

    if let Some(alignment) = &exploration.best_match_alignment {
        println!();
        if alignment.is_valid {
            println!(
                "Institutional alignment: {:.1} ({})",
                alignment.score,
                alignment.keywords.join(", ")
            );
        } else {
            println!("Institutional alignment: none detected");
        }
    }

    println!();
    match &report.narrative {
        Enrichment::Available { value } => {
            println!("Narrative ({}):", value.model);
            println!("{}", value.text);
            println!();
            println!("Audit: {:?} - {}", value.audit.status, value.audit.message);
            if value.alignment.is_valid {
                println!("Narrative institutions: {}", value.alignment.keywords.join(", "));
            }
        }
        Enrichment::Unavailable { reason } => println!("Narrative unavailable: {}", reason),
        Enrichment::Skipped => {}
    }

    match &report.biography {
        Enrichment::Available { value } => {
            println!();
            println!(
                "CBDB: {} ({}-{}), {}, native of {}, id {}",
                value.name, value.birth, value.death, value.dynasty, value.native, value.id
            );
        }
        Enrichment::Unavailable { reason } => {
            println!();
            println!("CBDB: {}", reason);
        }
        Enrichment::Skipped => {}
    }

    if let Some(points) = &output.projection {
        println!();
        println!("Projection:");
        for p in points {
            println!("  {:>9.4} {:>9.4}  {:?}  {}", p.x, p.y, p.kind, p.label);
        }
    }
}
