//! TOML-based configuration for deep-researcher
//!
//! This module provides declarative configuration for providers, models, the
//! per-step model assignment of the research workflow, search backends and
//! logging via a TOML file (`researcher.toml`).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound on sub-topics per section; bounds researcher fan-out width
pub const MAX_TOPICS_PER_SECTION: usize = 3;

/// Root configuration structure loaded from researcher.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearcherConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named LLM provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Named model configurations that reference providers
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Model assignment for each workflow step
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Search backend configuration
    #[serde(default)]
    pub search: SearchConfig,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
    OpenAI {
        /// Environment variable containing API key
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

// ============= Model Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Reference to a provider name defined in [providers]
    pub provider: String,

    /// Model name/identifier to use with the provider
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_model_max_tokens")]
    pub max_tokens: u32,

    /// Extra attempts for transient failures or unparsable structured replies
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_temperature() -> f32 {
    0.0
}

fn default_model_max_tokens() -> u32 {
    2048
}

fn default_max_retries() -> u32 {
    2
}

// ============= Workflow Configuration =============

/// Which model runs each step of the research workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Narrative plan from topic and outline
    #[serde(default = "default_model_ref")]
    pub planner: String,

    /// Extraction of the narrative plan into sections
    #[serde(default = "default_model_ref")]
    pub plan_schema: String,

    /// Search tool selection inside a search unit
    #[serde(default = "default_model_ref")]
    pub search_query: String,

    /// Sub-topic identification for a section
    #[serde(default = "default_model_ref")]
    pub topics: String,

    /// Writing a section from search results
    #[serde(default = "default_model_ref")]
    pub section_writer: String,

    /// Writing a section from already written sections only
    #[serde(default = "default_model_ref")]
    pub plain_writer: String,

    #[serde(default = "default_max_topics")]
    pub max_topics: usize,
}

fn default_model_ref() -> String {
    "default".to_string()
}

fn default_max_topics() -> usize {
    MAX_TOPICS_PER_SECTION
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            planner: default_model_ref(),
            plan_schema: default_model_ref(),
            search_query: default_model_ref(),
            topics: default_model_ref(),
            section_writer: default_model_ref(),
            plain_writer: default_model_ref(),
            max_topics: default_max_topics(),
        }
    }
}

impl WorkflowConfig {
    /// (step, model) pairs in workflow order
    pub fn steps(&self) -> [(&'static str, &str); 6] {
        [
            ("planner", self.planner.as_str()),
            ("plan_schema", self.plan_schema.as_str()),
            ("search_query", self.search_query.as_str()),
            ("topics", self.topics.as_str()),
            ("section_writer", self.section_writer.as_str()),
            ("plain_writer", self.plain_writer.as_str()),
        ]
    }
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub wikipedia: BackendConfig,

    #[serde(default)]
    pub web: WebSearchConfig,

    #[serde(default)]
    pub arxiv: BackendConfig,
}

impl SearchConfig {
    pub fn any_enabled(&self) -> bool {
        self.wikipedia.enabled || self.web.enabled || self.arxiv.enabled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Backend-specific default when unset
    #[serde(default)]
    pub max_results: Option<usize>,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// Override the API endpoint (used for self-hosted mirrors and tests)
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_search_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_results: None,
            timeout_secs: default_search_timeout(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WebProvider {
    #[default]
    DuckDuckGo,
    Tavily,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub provider: WebProvider,

    #[serde(default)]
    pub max_results: Option<usize>,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// Environment variable containing the Tavily API key
    #[serde(default = "default_tavily_key_env")]
    pub tavily_api_key_env: String,

    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_tavily_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: WebProvider::default(),
            max_results: None,
            timeout_secs: default_search_timeout(),
            tavily_api_key_env: default_tavily_key_env(),
            base_url: None,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    UnusedProvider,
    UnusedModel,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Provider '{0}' referenced by model '{1}' does not exist")]
    MissingProvider(String, String),

    #[error("Model '{0}' referenced by workflow step '{1}' does not exist")]
    MissingModel(String, String),
}

impl ResearcherConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse without validating
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        for provider in self.providers.values() {
            if let ProviderConfig::OpenAI { api_key_env, .. } = provider {
                self.validate_env_var(api_key_env)?;
            }
        }

        for (model_name, model_config) in &self.models {
            if !self.providers.contains_key(&model_config.provider) {
                return Err(ConfigError::MissingProvider(
                    model_config.provider.clone(),
                    model_name.clone(),
                ));
            }
        }

        for (step, model) in self.workflow.steps() {
            if !self.models.contains_key(model) {
                return Err(ConfigError::MissingModel(model.to_string(), step.to_string()));
            }
        }

        if !(1..=MAX_TOPICS_PER_SECTION).contains(&self.workflow.max_topics) {
            return Err(ConfigError::ValidationError(format!(
                "workflow.max_topics must be between 1 and {}, got {}",
                MAX_TOPICS_PER_SECTION, self.workflow.max_topics
            )));
        }

        if !self.search.any_enabled() {
            return Err(ConfigError::ValidationError(
                "At least one search backend must be enabled".to_string(),
            ));
        }

        if self.search.web.enabled && self.search.web.provider == WebProvider::Tavily {
            self.validate_env_var(&self.search.web.tavily_api_key_env)?;
        }

        Ok(())
    }

    /// Validate configuration with warnings for unused items
    ///
    /// Returns Ok with warnings, or Err if validation fails
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(self.check_unused_providers());
        warnings.extend(self.check_unused_models());
        Ok(warnings)
    }

    /// Check for providers that aren't referenced by any model
    fn check_unused_providers(&self) -> Vec<ConfigWarning> {
        let referenced: HashSet<_> = self.models.values().map(|m| m.provider.as_str()).collect();

        let mut warnings: Vec<_> = self
            .providers
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .map(|name| ConfigWarning {
                kind: ConfigWarningKind::UnusedProvider,
                message: format!(
                    "Provider '{}' is defined but not referenced by any model",
                    name
                ),
            })
            .collect();
        warnings.sort_by(|a, b| a.message.cmp(&b.message));
        warnings
    }

    /// Check for models that aren't used by any workflow step
    fn check_unused_models(&self) -> Vec<ConfigWarning> {
        let referenced: HashSet<_> = self.workflow.steps().iter().map(|(_, m)| *m).collect();

        let mut warnings: Vec<_> = self
            .models
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .map(|name| ConfigWarning {
                kind: ConfigWarningKind::UnusedModel,
                message: format!(
                    "Model '{}' is defined but not used by any workflow step",
                    name
                ),
            })
            .collect();
        warnings.sort_by(|a, b| a.message.cmp(&b.message));
        warnings
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Get provider by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Get model by name
    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }
}
