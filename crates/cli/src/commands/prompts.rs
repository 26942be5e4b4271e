//! Prompts command handler.

use alertsbot_core::{config::AppConfig, AppResult};
use alertsbot_prompt::{list_prompts, load_prompt};
use serde::Serialize;

/// List the answer prompts available to `ask` and `chat`
#[derive(clap::Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptSummary {
    id: String,
    title: String,
}

impl PromptsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing prompts command");

        let mut summaries = Vec::new();
        for id in list_prompts(&config.workspace)? {
            match load_prompt(&config.workspace, &id) {
                Ok(definition) => summaries.push(PromptSummary {
                    id,
                    title: definition.title,
                }),
                Err(e) => tracing::warn!("Skipping prompt '{}': {}", id, e),
            }
        }

        if self.json {
            return super::print_json(&summaries);
        }

        for summary in &summaries {
            println!("{:<32} {}", summary.id, summary.title);
        }

        Ok(())
    }
}
