//! Stats command handler.
//!
//! Summarizes the corpus manifest without loading the index.

use alertsbot_core::{config::AppConfig, AppResult};
use alertsbot_corpus::Corpus;

/// Show corpus statistics
#[derive(clap::Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = Corpus::stats(&config.corpus_dir())?;

        if self.json {
            return super::print_json(&stats);
        }

        println!("Build:      {}", stats.build_id);
        println!("Created:    {}", stats.created_at.to_rfc3339());
        println!("Articles:   {}", stats.article_count);
        println!("Dimension:  {} ({})", stats.dimension, stats.metric);
        println!(
            "Embedding:  {} / {}{}",
            stats.embedding_provider,
            stats.embedding_model,
            if stats.normalize { " (normalized)" } else { "" }
        );
        println!(
            "Size:       {} bytes articles, {} bytes index",
            stats.articles_bytes, stats.index_bytes
        );

        Ok(())
    }
}
