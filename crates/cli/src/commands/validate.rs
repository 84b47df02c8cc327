//! Validate command handler.
//!
//! Runs the institutional alignment check (and, with `--query`, the entity
//! audit) on arbitrary text.

use crate::commands::{print_json, workspace_path};
use clap::Args;
use mingyu_core::{config::AppConfig, AppError, AppResult};
use mingyu_knowledge::alignment::{validate, Alignment};
use mingyu_knowledge::audit::{audit, AuditReport};
use mingyu_knowledge::keywords::KeywordExtractor;
use serde::Serialize;
use std::path::PathBuf;

/// Check text against Ming institutional vocabulary
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Text to check
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Also audit the text against this query's entities
    #[arg(short, long)]
    pub query: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ValidateOutput {
    alignment: Alignment,

    #[serde(skip_serializing_if = "Option::is_none")]
    audit: Option<AuditReport>,
}

impl ValidateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing validate command");

        let text = match (&self.text, &self.file) {
            (Some(text), _) => text.clone(),
            (None, Some(file)) => std::fs::read_to_string(workspace_path(config, file))?,
            (None, None) => {
                return Err(AppError::Config(
                    "No text given. Pass text or --file".to_string(),
                ))
            }
        };

        let output = ValidateOutput {
            alignment: validate(&text),
            audit: self
                .query
                .as_deref()
                .map(|query| audit(&KeywordExtractor::new(), query, &text)),
        };

        if self.json {
            return print_json(&output);
        }

        let alignment = &output.alignment;
        if alignment.is_valid {
            println!(
                "Aligned: score {:.1}, keywords: {}",
                alignment.score,
                alignment.keywords.join(", ")
            );
        } else {
            println!("Not aligned: no institutional keywords found");
        }

        if let Some(report) = &output.audit {
            println!("Audit: {:?} - {}", report.status, report.message);
        }

        Ok(())
    }
}
