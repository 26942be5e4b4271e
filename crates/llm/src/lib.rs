//! Answer-generation clients for alertsbot.
//!
//! Provider-agnostic access to the hosted (or local) generative model that
//! turns an assembled article context into an answer. The retrieval core never
//! depends on this crate; only the answer orchestration and the CLI do.
//!
//! # Providers
//! - **Gemini**: Google Generative Language REST API (default)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use alertsbot_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Summarise the latest visa alert.", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use types::ProviderType;
