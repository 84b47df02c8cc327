//! Prompt system for MingYu.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions (`.mingyu/prompts/<id>.yml`)
//! - A built-in counterfactual narrative prompt used when none is configured
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, list_prompts, load_prompt, resolve_prompt, NARRATIVE_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptOutputSpec};
