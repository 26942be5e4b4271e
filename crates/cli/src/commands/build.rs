//! Build command handler.
//!
//! Imports a scraper JSON file and writes the corpus (articles, index,
//! manifest) into the corpus directory.

use alertsbot_core::{config::AppConfig, AppResult};
use alertsbot_corpus::{build_corpus, EmbeddingConfig, ProgressEvent, ProgressReporter};
use std::path::PathBuf;
use std::sync::Arc;

/// Import scraped articles and build the corpus
#[derive(clap::Args, Debug)]
pub struct BuildCommand {
    /// Scraper output: a JSON array of {title, date, content, url}
    #[arg(short, long)]
    pub articles: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing build command");
        tracing::debug!("Build options: {:?}", self);

        let corpus_dir = config.corpus_dir();

        // embedding.yaml from a previous build (or hand-written) wins
        let embedding = EmbeddingConfig::load(&corpus_dir)?;

        let progress = if self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| {
                eprintln!("{}", event.format_simple());
            }))
        };

        let stats = build_corpus(&self.articles, &corpus_dir, embedding.clone(), &progress).await?;
        embedding.save(&corpus_dir)?;

        if self.json {
            super::print_json(&stats)?;
        } else {
            println!(
                "Indexed {} of {} articles ({} dropped, dimension {}) in {:.2}s",
                stats.articles_indexed,
                stats.articles_read,
                stats.articles_dropped,
                stats.dimension,
                stats.duration_secs
            );
            println!("Corpus {} written to {}", stats.build_id, stats.corpus_dir.display());
        }

        Ok(())
    }
}
