//! Configuration management for alertsbot.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Config files (.alertsbot/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with the built corpus and prompt
//! overrides stored under `.alertsbot/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default number of articles retrieved per query.
pub const DEFAULT_TOP_K: u32 = 3;

/// Environment variable holding the Gemini API key when no config overrides it.
pub const DEFAULT_GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// CLI behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .alertsbot/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Answer-generation provider ("gemini" or "ollama")
    pub provider: String,

    /// Answer-generation model identifier
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Corpus location and retrieval defaults
    pub corpus: CorpusSettings,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,
}

/// Corpus location and retrieval defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusSettings {
    /// Corpus directory; defaults to `.alertsbot/corpus` under the workspace
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Number of articles retrieved per query
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: u32,
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            path: None,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::Gemini { model, .. } => model,
            ProviderConfig::Ollama { model, .. } => model,
        }
    }

    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::Gemini { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    corpus: Option<CorpusSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            corpus: CorpusSettings::default(),
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `ALERTSBOT_WORKSPACE`: Override workspace path
    /// - `ALERTSBOT_CONFIG`: Path to config file
    /// - `ALERTSBOT_PROVIDER`: LLM provider
    /// - `ALERTSBOT_MODEL`: Model identifier
    /// - `ALERTSBOT_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use alertsbot_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`load`](Self::load), with an explicit workspace and config file
    /// (the `--workspace`/`--config` flags) taking precedence over
    /// `ALERTSBOT_WORKSPACE`/`ALERTSBOT_CONFIG`.
    ///
    /// Both decide which YAML file is read, so they must be known before the
    /// merge rather than applied afterwards.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(path) = workspace.or_else(|| {
            std::env::var("ALERTSBOT_WORKSPACE").ok().map(PathBuf::from)
        }) {
            config.workspace = path;
        }

        config.config_file = config_file.or_else(|| {
            std::env::var("ALERTSBOT_CONFIG").ok().map(PathBuf::from)
        });

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.alertsbot_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("ALERTSBOT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("ALERTSBOT_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("ALERTSBOT_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(corpus) = config_file.corpus {
            result.corpus = corpus;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        tracing::debug!("Merged configuration from {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    /// Workspace and config file are not overrides; pass them to
    /// [`load_from`](Self::load_from).
    pub fn with_overrides(
        mut self,
        corpus: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(corpus) = corpus {
            self.corpus.path = Some(corpus);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .alertsbot directory.
    pub fn alertsbot_dir(&self) -> PathBuf {
        self.workspace.join(".alertsbot")
    }

    /// Ensure the .alertsbot directory exists.
    pub fn ensure_alertsbot_dir(&self) -> AppResult<()> {
        let dir = self.alertsbot_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .alertsbot directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Directory holding the built corpus (articles, index, manifest).
    pub fn corpus_dir(&self) -> PathBuf {
        match self.corpus.path {
            Some(ref path) if path.is_absolute() => path.clone(),
            Some(ref path) => self.workspace.join(path),
            None => self.alertsbot_dir().join("corpus"),
        }
    }

    /// Get the configuration of a provider, if one is declared.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint override for the active provider.
    pub fn provider_endpoint(&self) -> Option<&str> {
        self.get_provider_config(&self.provider)
            .and_then(|pc| pc.endpoint())
    }

    /// Resolve the API key for a provider.
    ///
    /// `ALERTSBOT_API_KEY` wins; otherwise the provider's `apiKeyEnv` (or
    /// `GEMINI_API_KEY` for an undeclared Gemini provider) is read.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::Gemini { api_key_env, .. }) => Some(api_key_env.clone()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "gemini" => Some(DEFAULT_GEMINI_KEY_ENV.to_string()),
            None => None,
        };

        env_var.and_then(|var| std::env::var(var).ok())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["gemini", "ollama"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.corpus.top_k == 0 {
            return Err(AppError::Config("corpus.topK must be positive".to_string()));
        }

        if self.provider == "gemini" && self.resolve_api_key("gemini").is_none() {
            return Err(AppError::Config(format!(
                "API key for provider 'gemini' not found (set ALERTSBOT_API_KEY or {})",
                self.get_provider_config("gemini")
                    .and_then(|pc| match pc {
                        ProviderConfig::Gemini { api_key_env, .. } => Some(api_key_env.as_str()),
                        _ => None,
                    })
                    .unwrap_or(DEFAULT_GEMINI_KEY_ENV)
            )));
        }

        Ok(())
    }
}
