//! Context command handler.
//!
//! Prints exactly what the answer model would be given for a query.

use alertsbot_core::{config::AppConfig, AppError, AppResult};
use alertsbot_corpus::assemble_context;

/// Print the context block the model would receive
#[derive(clap::Args, Debug)]
pub struct ContextCommand {
    /// Query text
    pub query: String,

    /// Number of articles to retrieve (default: corpus.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

impl ContextCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing context command");

        let ctx = super::open_retrieval(config).await?;
        let top_k = super::resolve_top_k(self.top_k, config);

        let articles = ctx.retrieve(&self.query, top_k).await?;

        match assemble_context(&articles).as_text() {
            Some(text) => print!("{}", text),
            None => eprintln!("{}", super::describe_error(&AppError::NoRelevantContext)),
        }

        Ok(())
    }
}
