//! Answer orchestration: retrieve, assemble context, ask the model.

use crate::context::{assemble_context, AssembledContext};
use crate::retriever::RetrievalContext;
use crate::types::{Article, ScoredArticle};
use alertsbot_core::AppResult;
use alertsbot_llm::{LlmClient, LlmRequest, LlmStream};
use alertsbot_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reply used when retrieval finds nothing; the model is not called.
pub const NO_CONTEXT_ANSWER: &str = "I'm sorry, but I couldn't find any relevant information in the provided articles to answer your question.";

/// Parameters of one answer request.
#[derive(Debug, Clone)]
pub struct AnswerOptions {
    pub query: String,
    pub top_k: usize,
    /// Model identifier passed to the LLM client
    pub model: String,
    pub max_tokens: Option<u32>,
}

/// An article an answer was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: Option<String>,
    pub url: String,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,

    /// Retrieved articles in rank order, one entry per URL
    pub sources: Vec<SourceRef>,

    /// False when no context was found and the fixed reply was returned
    pub grounded: bool,
}

impl AnswerResponse {
    pub fn no_context() -> Self {
        Self {
            answer: NO_CONTEXT_ANSWER.to_string(),
            sources: Vec::new(),
            grounded: false,
        }
    }
}

/// A streamed answer, or the fixed reply when there was nothing to stream.
pub enum StreamedAnswer {
    NoContext(AnswerResponse),
    Streaming {
        stream: LlmStream,
        sources: Vec<SourceRef>,
    },
}

/// Prepared model request plus the sources it was built from.
enum Prepared {
    NoContext,
    Ready {
        request: LlmRequest,
        sources: Vec<SourceRef>,
    },
}

async fn prepare(
    ctx: &RetrievalContext,
    prompt: &PromptDefinition,
    options: &AnswerOptions,
) -> AppResult<Prepared> {
    let hits = ctx.retrieve_scored(&options.query, options.top_k).await?;
    let articles: Vec<Article> = hits.iter().map(|h| h.article.clone()).collect();

    let context = match assemble_context(&articles) {
        AssembledContext::Context(text) => text,
        AssembledContext::NoRelevantContext => {
            tracing::info!("No relevant articles for query; skipping model call");
            return Ok(Prepared::NoContext);
        }
    };

    let mut variables = HashMap::new();
    variables.insert("query".to_string(), options.query.clone());
    variables.insert("context".to_string(), context);

    let built = build_prompt(prompt, variables)?;

    let mut request = LlmRequest::new(built.user, options.model.clone());
    if let Some(system) = built.system {
        request = request.with_system(system);
    }
    if let Some(temperature) = built.metadata.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(top_p) = built.metadata.top_p {
        request = request.with_top_p(top_p);
    }
    if let Some(max_tokens) = options.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    Ok(Prepared::Ready {
        request,
        sources: source_refs(&hits),
    })
}

/// Answer `options.query` from the corpus.
///
/// Retrieval errors (`InvalidQuery`, `Embedding`) and model errors are
/// returned unchanged; an empty retrieval yields [`NO_CONTEXT_ANSWER`].
pub async fn answer(
    ctx: &RetrievalContext,
    llm: &dyn LlmClient,
    prompt: &PromptDefinition,
    options: &AnswerOptions,
) -> AppResult<AnswerResponse> {
    tracing::info!(
        "Answering with provider '{}' (top_k={})",
        llm.provider_name(),
        options.top_k
    );

    let (request, sources) = match prepare(ctx, prompt, options).await? {
        Prepared::NoContext => return Ok(AnswerResponse::no_context()),
        Prepared::Ready { request, sources } => (request, sources),
    };

    let response = llm.complete(&request).await?;

    tracing::debug!(
        "Model '{}' answered using {} tokens",
        response.model,
        response.usage.total_tokens
    );

    Ok(AnswerResponse {
        answer: response.content.trim().to_string(),
        sources,
        grounded: true,
    })
}

/// Streaming counterpart of [`answer`].
pub async fn answer_stream(
    ctx: &RetrievalContext,
    llm: &dyn LlmClient,
    prompt: &PromptDefinition,
    options: &AnswerOptions,
) -> AppResult<StreamedAnswer> {
    match prepare(ctx, prompt, options).await? {
        Prepared::NoContext => Ok(StreamedAnswer::NoContext(AnswerResponse::no_context())),
        Prepared::Ready { request, sources } => {
            let stream = llm.stream(&request.with_streaming()).await?;
            Ok(StreamedAnswer::Streaming { stream, sources })
        }
    }
}

fn source_refs(hits: &[ScoredArticle]) -> Vec<SourceRef> {
    let mut sources: Vec<SourceRef> = Vec::new();
    for hit in hits {
        if sources.iter().all(|s| s.url != hit.article.url) {
            sources.push(SourceRef {
                title: hit.article.title.clone(),
                url: hit.article.url.clone(),
                distance: hit.distance,
            });
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use crate::embeddings::providers::MockProvider;
    use crate::embeddings::{Embedder, EmbeddingConfig};
    use crate::progress::ProgressReporter;
    use crate::store::ArticleStore;
    use alertsbot_core::AppError;
    use alertsbot_llm::{LlmResponse, LlmStreamChunk, LlmUsage};
    use alertsbot_prompt::default_answer_prompt;
    use futures::StreamExt;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingLlm {
        requests: Mutex<Vec<LlmRequest>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl LlmClient for RecordingLlm {
        fn provider_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(AppError::Llm("quota exceeded".to_string()));
            }
            Ok(LlmResponse {
                content: "  Visa rules changed [u1].\n".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 5),
                done: true,
            })
        }

        async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
            self.requests.lock().unwrap().push(request.clone());
            let chunks = vec![
                Ok(LlmStreamChunk {
                    content: "Visa ".to_string(),
                    model: request.model.clone(),
                    done: false,
                    usage: None,
                }),
                Ok(LlmStreamChunk {
                    content: "rules changed.".to_string(),
                    model: request.model.clone(),
                    done: true,
                    usage: None,
                }),
            ];
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    async fn context(articles: Vec<Article>) -> RetrievalContext {
        let config = EmbeddingConfig {
            provider: "mock".to_string(),
            model: "mock-v1".to_string(),
            dimensions: 64,
            ..Default::default()
        };
        let embedder = Embedder::new(Arc::new(MockProvider::new(64)), config).unwrap();
        let (corpus, _) = Corpus::build(
            ArticleStore::new(articles),
            &embedder,
            &ProgressReporter::noop(),
        )
        .await
        .unwrap();
        RetrievalContext::new(Arc::new(corpus), embedder).unwrap()
    }

    fn options(query: &str) -> AnswerOptions {
        AnswerOptions {
            query: query.to_string(),
            top_k: 3,
            model: "test-model".to_string(),
            max_tokens: Some(256),
        }
    }

    fn articles() -> Vec<Article> {
        vec![
            Article::new("A", "1 Jan", "visa rules changed", "u1"),
            Article::new("B", "2 Jan", "tax deadline extended", "u2"),
        ]
    }

    #[tokio::test]
    async fn test_answer_renders_context_into_prompt() {
        let ctx = context(articles()).await;
        let llm = RecordingLlm::default();

        let response = answer(&ctx, &llm, &default_answer_prompt(), &options("visa"))
            .await
            .unwrap();

        assert_eq!(response.answer, "Visa rules changed [u1].");
        assert!(response.grounded);
        assert_eq!(response.sources.len(), 2);

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "test-model");
        assert_eq!(requests[0].max_tokens, Some(256));
        assert!(requests[0].prompt.contains("Question: visa"));
        assert!(requests[0].prompt.contains("URL: u1\nContent: visa rules changed"));
    }

    #[tokio::test]
    async fn test_prompt_sampling_settings_reach_request() {
        let ctx = context(articles()).await;
        let llm = RecordingLlm::default();

        let mut prompt = default_answer_prompt();
        prompt.behavior.temperature = Some(0.2);
        prompt.behavior.top_p = Some(0.8);

        answer(&ctx, &llm, &prompt, &options("visa")).await.unwrap();

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, Some(0.2));
        assert_eq!(requests[0].top_p, Some(0.8));
    }

    #[tokio::test]
    async fn test_empty_corpus_returns_fixed_reply_without_model_call() {
        let ctx = context(Vec::new()).await;
        let llm = RecordingLlm::default();

        let response = answer(&ctx, &llm, &default_answer_prompt(), &options("visa"))
            .await
            .unwrap();

        assert_eq!(response.answer, NO_CONTEXT_ANSWER);
        assert!(!response.grounded);
        assert!(llm.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_query_propagates() {
        let ctx = context(articles()).await;
        let llm = RecordingLlm::default();

        let err = answer(&ctx, &llm, &default_answer_prompt(), &options("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuery(_)));
        assert!(llm.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let ctx = context(articles()).await;
        let llm = RecordingLlm {
            fail: true,
            ..Default::default()
        };

        let err = answer(&ctx, &llm, &default_answer_prompt(), &options("visa"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_answer_stream() {
        let ctx = context(articles()).await;
        let llm = RecordingLlm::default();

        let streamed = answer_stream(&ctx, &llm, &default_answer_prompt(), &options("visa"))
            .await
            .unwrap();

        match streamed {
            StreamedAnswer::Streaming { mut stream, sources } => {
                assert_eq!(sources[0].url, "u1");
                let mut text = String::new();
                while let Some(chunk) = stream.next().await {
                    text.push_str(&chunk.unwrap().content);
                }
                assert_eq!(text, "Visa rules changed.");
            }
            StreamedAnswer::NoContext(_) => panic!("expected a stream"),
        }

        assert!(llm.requests.lock().unwrap()[0].stream);
    }

    #[test]
    fn test_source_refs_dedup_by_url() {
        let hit = |url: &str, distance: f32| ScoredArticle {
            article: Article::new("T", "D", "C", url),
            distance,
            position: 0,
        };

        let sources = source_refs(&[hit("u1", 0.1), hit("u1", 0.2), hit("u2", 0.3)]);
        let urls: Vec<_> = sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["u1", "u2"]);
    }
}
