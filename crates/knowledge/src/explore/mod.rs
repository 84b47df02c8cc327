//! Exploration: anchor a hypothetical query in the corpus, interpolate, and
//! optionally narrate the result.

pub mod engine;
pub mod narrate;
pub mod types;

pub use engine::HistoryEngine;
pub use narrate::{enrich_biography, narrate, prompt_variables, NarrationSettings, NO_CLIENT_REASON};
pub use types::{Enrichment, Exploration, ExplorationReport, Narrative, UNKNOWN_NAME};
