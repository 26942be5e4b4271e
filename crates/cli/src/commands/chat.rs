//! Chat command handler.
//!
//! Reads one question per line from stdin and answers each. The corpus,
//! embedder and LLM client are set up once; per-question failures are
//! reported and the loop carries on.

use super::ask::{print_answer, Answerer};
use alertsbot_core::{config::AppConfig, AppError, AppResult};
use alertsbot_corpus::answer;
use alertsbot_prompt::DEFAULT_ANSWER_PROMPT_ID;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Answer questions read line by line from stdin
#[derive(clap::Args, Debug)]
pub struct ChatCommand {
    /// Number of articles to retrieve per question (default: corpus.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Prompt definition to answer with (see `alertsbot prompts`)
    #[arg(long, default_value = DEFAULT_ANSWER_PROMPT_ID)]
    pub prompt: String,
}

/// Lines that end the session.
fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit" | ":q")
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let ctx = super::open_retrieval(config).await?;
        let answerer = Answerer::from_config(config, &self.prompt)?;
        let top_k = super::resolve_top_k(self.top_k, config);

        eprintln!(
            "Loaded {} articles. Ask a question, or type 'exit' to quit.",
            ctx.corpus().len()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            eprint!("> ");
            std::io::stderr().flush().ok();

            let Some(line) = lines.next_line().await? else {
                break;
            };

            if is_exit_command(&line) {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let options = answerer.options(config, &line, top_k);
            match answer(&ctx, answerer.client.as_ref(), &answerer.prompt, &options).await {
                Ok(response) => print_answer(&response),
                Err(e) if e.kind().is_fatal() => return Err(e),
                Err(e @ AppError::Llm(_)) => {
                    tracing::warn!("Answer generation failed: {}", e);
                    println!("{}", super::generation_failed_message(&e));
                }
                Err(e) => {
                    tracing::warn!("Question failed: {}", e);
                    println!("{}", super::describe_error(&e));
                }
            }
            println!();
        }

        Ok(())
    }
}
