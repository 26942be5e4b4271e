//! Search command handler.

use alertsbot_core::{config::AppConfig, AppResult};
use serde::Serialize;

/// Show the articles closest to a query
#[derive(clap::Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of articles to retrieve (default: corpus.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit<'a> {
    rank: usize,
    distance: f32,
    title: Option<&'a str>,
    date: Option<&'a str>,
    url: &'a str,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let ctx = super::open_retrieval(config).await?;
        let top_k = super::resolve_top_k(self.top_k, config);

        let hits = ctx.retrieve_scored(&self.query, top_k).await?;

        if self.json {
            let output: Vec<SearchHit> = hits
                .iter()
                .enumerate()
                .map(|(i, hit)| SearchHit {
                    rank: i + 1,
                    distance: hit.distance,
                    title: hit.article.title.as_deref(),
                    date: hit.article.date.as_deref(),
                    url: &hit.article.url,
                })
                .collect();
            return super::print_json(&output);
        }

        if hits.is_empty() {
            println!("No articles in the corpus.");
            return Ok(());
        }

        for (i, hit) in hits.iter().enumerate() {
            println!(
                "{}. [{:.4}] {} ({})",
                i + 1,
                hit.distance,
                hit.article.title.as_deref().unwrap_or("No Title"),
                hit.article.date.as_deref().unwrap_or("No Date")
            );
            println!("   {}", hit.article.url);
        }

        Ok(())
    }
}
