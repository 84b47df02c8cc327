//! Biography command handler.

use crate::commands::print_json;
use clap::Args;
use mingyu_core::{config::AppConfig, AppResult};
use mingyu_knowledge::biography::BiographyClient;
use std::time::Duration;

/// Look up a person in the China Biographical Database
#[derive(Args, Debug)]
pub struct BiographyCommand {
    /// Name in Simplified Chinese
    pub name: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BiographyCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing biography command for '{}'", self.name);

        let client = BiographyClient::new(
            config.biography.endpoint.clone(),
            Duration::from_secs(config.biography.timeout),
        )?;
        let bio = client.lookup(&self.name).await;

        if self.json {
            return print_json(&bio);
        }

        match bio {
            Some(bio) => {
                println!("{} ({})", bio.name, bio.dynasty);
                println!("  Born: {}", bio.birth);
                println!("  Died: {}", bio.death);
                println!("  Native place: {}", bio.native);
                println!("  CBDB id: {}", bio.id);
            }
            None => println!("No CBDB record found for {}", self.name),
        }

        Ok(())
    }
}
