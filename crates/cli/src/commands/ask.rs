//! Ask command handler.
//!
//! Retrieves articles for a question, renders the answer prompt and sends it
//! to the configured LLM provider.

use alertsbot_core::{config::AppConfig, AppError, AppResult};
use alertsbot_corpus::{answer, answer_stream, AnswerOptions, AnswerResponse, SourceRef, StreamedAnswer};
use alertsbot_llm::{create_client, LlmClient};
use alertsbot_prompt::{load_prompt, PromptDefinition, DEFAULT_ANSWER_PROMPT_ID};
use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;

/// Answer a question from the corpus
#[derive(clap::Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Number of articles to retrieve (default: corpus.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Prompt definition to answer with (see `alertsbot prompts`)
    #[arg(long, default_value = DEFAULT_ANSWER_PROMPT_ID)]
    pub prompt: String,

    /// Stream the answer as it is generated
    #[arg(long, conflicts_with = "json")]
    pub stream: bool,

    /// Maximum tokens in response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// LLM client and answer prompt, resolved once per process.
pub struct Answerer {
    pub client: Arc<dyn LlmClient>,
    pub prompt: PromptDefinition,
}

impl Answerer {
    pub fn from_config(config: &AppConfig, prompt_id: &str) -> AppResult<Self> {
        config.validate()?;

        let api_key = config.resolve_api_key(&config.provider);
        let client = create_client(
            &config.provider,
            config.provider_endpoint(),
            api_key.as_deref(),
        )?;

        let prompt = load_prompt(&config.workspace, prompt_id)?;
        tracing::debug!("Loaded prompt definition: {}", prompt.id);

        Ok(Self { client, prompt })
    }

    pub fn options(&self, config: &AppConfig, query: &str, top_k: usize) -> AnswerOptions {
        AnswerOptions {
            query: query.to_string(),
            top_k,
            model: config.model.clone(),
            max_tokens: None,
        }
    }
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let ctx = super::open_retrieval(config).await?;
        let answerer = Answerer::from_config(config, &self.prompt)?;

        let mut options = answerer.options(config, &self.query, super::resolve_top_k(self.top_k, config));
        options.max_tokens = self.max_tokens;

        if self.stream {
            let streamed =
                answer_stream(&ctx, answerer.client.as_ref(), &answerer.prompt, &options).await?;
            return print_streamed(streamed).await;
        }

        match answer(&ctx, answerer.client.as_ref(), &answerer.prompt, &options).await {
            Ok(response) if self.json => super::print_json(&response),
            Ok(response) => {
                print_answer(&response);
                Ok(())
            }
            Err(e @ AppError::Llm(_)) => {
                tracing::warn!("Answer generation failed: {}", e);
                println!("{}", super::generation_failed_message(&e));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

pub fn print_answer(response: &AnswerResponse) {
    println!("{}", response.answer);
    print_sources(&response.sources);
}

fn print_sources(sources: &[SourceRef]) {
    if sources.is_empty() {
        return;
    }

    println!();
    println!("Sources:");
    for source in sources {
        println!(
            "- {} ({})",
            source.title.as_deref().unwrap_or("No Title"),
            source.url
        );
    }
}

/// Write a streamed answer to stdout as chunks arrive.
async fn print_streamed(streamed: StreamedAnswer) -> AppResult<()> {
    let (mut stream, sources) = match streamed {
        StreamedAnswer::NoContext(response) => {
            print_answer(&response);
            return Ok(());
        }
        StreamedAnswer::Streaming { stream, sources } => (stream, sources),
    };

    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                println!();
                println!("{}", super::generation_failed_message(&e));
                return Ok(());
            }
        };

        if !chunk.content.is_empty() {
            print!("{}", chunk.content);
            stdout.flush().ok();
        }

        if chunk.done {
            if let Some(usage) = chunk.usage {
                tracing::debug!(
                    "Token usage - Prompt: {}, Completion: {}, Total: {}",
                    usage.prompt_tokens,
                    usage.completion_tokens,
                    usage.total_tokens
                );
            }
            break;
        }
    }

    println!();
    print_sources(&sources);
    Ok(())
}
