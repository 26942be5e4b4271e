//! Gemini LLM provider implementation.
//!
//! Talks to the Google Generative Language REST API
//! (`models/{model}:generateContent` and `:streamGenerateContent`).
//! Rate-limit and overload responses (429/503) are retried with exponential
//! backoff; every other failure is surfaced immediately.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use alertsbot_core::{AppError, AppResult};
use futures::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Maximum attempts for retryable responses
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 250;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn finished(&self) -> bool {
        self.candidates
            .first()
            .map(|c| c.finish_reason.is_some())
            .unwrap_or(false)
    }

    fn usage(&self) -> Option<LlmUsage> {
        self.usage_metadata
            .as_ref()
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
    }
}

/// Gemini LLM client.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client against the public Generative Language endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_GEMINI_URL)
    }

    /// Create a client with a custom base URL (proxies, test servers).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn to_gemini_request(&self, request: &LlmRequest) -> GenerateContentRequest {
        let generation_config = if request.temperature.is_some()
            || request.top_p.is_some()
            || request.max_tokens.is_some()
        {
            Some(GenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction: request.system.as_ref().map(|system| Content {
                role: None,
                parts: vec![Part {
                    text: system.clone(),
                }],
            }),
            generation_config,
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// POST with retry on 429/503.
    async fn post_with_retries(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &GenerateContentRequest,
    ) -> AppResult<reqwest::Response> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let response = self
                .client
                .post(url)
                .query(query)
                .header("x-goog-api-key", &self.api_key)
                .json(body)
                .send()
                .await
                .map_err(|e| AppError::Llm(format!("Failed to send request to Gemini: {}", e)))?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let retryable =
                status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE;
            if retryable && attempt < MAX_RETRIES {
                let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                tracing::warn!(
                    "Gemini returned {} (attempt {}/{}), retrying in {}ms",
                    status,
                    attempt,
                    MAX_RETRIES,
                    backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                continue;
            }

            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }
    }
}

/// Parse one server-sent-event line (`data: {...}`) into a stream chunk.
fn parse_sse_line(line: &str, model: &str) -> Option<AppResult<LlmStreamChunk>> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }

    let parsed = serde_json::from_str::<GenerateContentResponse>(payload)
        .map_err(|e| AppError::Llm(format!("Failed to parse Gemini chunk: {}", e)))
        .map(|frame| {
            let done = frame.finished();
            LlmStreamChunk {
                content: frame.text(),
                model: frame.model_version.clone().unwrap_or_else(|| model.to_string()),
                done,
                usage: if done { frame.usage() } else { None },
            }
        });

    Some(parsed)
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to Gemini (model: {})", request.model);

        let body = self.to_gemini_request(request);
        let url = self.endpoint(&request.model, "generateContent");
        let response = self.post_with_retries(&url, &[], &body).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Gemini response: {}", e)))?;

        if parsed.candidates.is_empty() {
            return Err(AppError::Llm(
                "Gemini returned no candidates (the prompt may have been blocked)".to_string(),
            ));
        }

        tracing::debug!("Received completion from Gemini");

        Ok(LlmResponse {
            content: parsed.text(),
            model: parsed
                .model_version
                .clone()
                .unwrap_or_else(|| request.model.clone()),
            usage: parsed.usage().unwrap_or_default(),
            done: true,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!("Starting streaming request to Gemini (model: {})", request.model);

        let body = self.to_gemini_request(request);
        let url = self.endpoint(&request.model, "streamGenerateContent");
        let response = self
            .post_with_retries(&url, &[("alt", "sse")], &body)
            .await?;

        let model = request.model.clone();
        let stream = response.bytes_stream().map(move |result| {
            let bytes = result.map_err(|e| AppError::Llm(format!("Stream error: {}", e)))?;
            let text = String::from_utf8_lossy(&bytes);
            let chunks: Vec<AppResult<LlmStreamChunk>> = text
                .lines()
                .filter_map(|line| parse_sse_line(line, &model))
                .collect();
            Ok(futures::stream::iter(chunks))
        });

        Ok(Box::pin(stream.flat_map(|result| match result {
            Ok(chunks) => chunks,
            Err(e) => futures::stream::iter(vec![Err(e)]),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_client_creation() {
        let client = GeminiClient::new("key");
        assert_eq!(client.provider_name(), "gemini");
        assert_eq!(
            client.endpoint("gemini-2.0-flash-exp", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_request_conversion() {
        let client = GeminiClient::new("key");
        let request = LlmRequest::new("Question: visa?", "gemini-2.0-flash-exp")
            .with_system("Answer from context")
            .with_max_tokens(256);

        let body = serde_json::to_value(client.to_gemini_request(&request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Question: visa?");
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "Answer from context"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert!(body["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn test_request_without_sampling_omits_generation_config() {
        let client = GeminiClient::new("key");
        let request = LlmRequest::new("hi", "gemini-2.0-flash-exp");
        let body = serde_json::to_value(client.to_gemini_request(&request)).unwrap();
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_text_and_usage() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "The deadline "}, {"text": "moved."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 4, "totalTokenCount": 44},
            "modelVersion": "gemini-2.0-flash-exp"
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text(), "The deadline moved.");
        assert!(parsed.finished());
        assert_eq!(parsed.usage(), Some(LlmUsage::new(40, 4)));
    }

    #[test]
    fn test_parse_sse_line() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"Hi"}]}}]}"#;
        let chunk = parse_sse_line(line, "gemini-2.0-flash-exp").unwrap().unwrap();
        assert_eq!(chunk.content, "Hi");
        assert!(!chunk.done);
        assert_eq!(chunk.model, "gemini-2.0-flash-exp");

        assert!(parse_sse_line("", "m").is_none());
        assert!(parse_sse_line(": keep-alive", "m").is_none());
    }
}
