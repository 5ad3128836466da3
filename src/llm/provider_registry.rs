//! Provider Registry for managing named LLM providers and models
//!
//! Resolves the `[providers]` and `[models]` tables of `researcher.toml` into
//! clients, and hands each workflow step the client configured for it.

use crate::llm::client::{LLMClient, Provider};
use crate::types::{AppError, Result};
use crate::utils::toml_config::{ModelConfig, ProviderConfig, ResearcherConfig};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry for managing multiple named LLM providers
pub struct ProviderRegistry {
    /// Provider configurations keyed by name
    providers: HashMap<String, ProviderConfig>,
    /// Model configurations keyed by name
    models: HashMap<String, ModelConfig>,
}

impl ProviderRegistry {
    /// Create a new empty provider registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            models: HashMap::new(),
        }
    }

    /// Create a provider registry from TOML configuration
    pub fn from_config(config: &ResearcherConfig) -> Self {
        Self {
            providers: config.providers.clone(),
            models: config.models.clone(),
        }
    }

    /// Register a provider configuration
    pub fn register_provider(&mut self, name: &str, config: ProviderConfig) {
        self.providers.insert(name.to_string(), config);
    }

    /// Register a model configuration
    pub fn register_model(&mut self, name: &str, config: ModelConfig) {
        self.models.insert(name.to_string(), config);
    }

    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }

    /// Get all model names, sorted
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Resolve the model -> provider chain for `model_name`
    pub fn provider_for_model(&self, model_name: &str) -> Result<Provider> {
        let model_config = self.get_model(model_name).ok_or_else(|| {
            AppError::Configuration(format!("Model '{}' not found in configuration", model_name))
        })?;

        let provider_config = self.get_provider(&model_config.provider).ok_or_else(|| {
            AppError::Configuration(format!(
                "Provider '{}' referenced by model '{}' not found",
                model_config.provider, model_name
            ))
        })?;

        Provider::from_model_config(model_config, provider_config)
    }

    /// Create an LLM client for a specific model by name
    pub fn create_client_for_model(&self, model_name: &str) -> Result<Arc<dyn LLMClient>> {
        self.provider_for_model(model_name)?.create_client()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The client each workflow step talks to
#[derive(Clone)]
pub struct StepClients {
    pub planner: Arc<dyn LLMClient>,
    pub plan_schema: Arc<dyn LLMClient>,
    pub search_query: Arc<dyn LLMClient>,
    pub topics: Arc<dyn LLMClient>,
    pub section_writer: Arc<dyn LLMClient>,
    pub plain_writer: Arc<dyn LLMClient>,
}

impl StepClients {
    /// Every step uses the same client
    pub fn uniform(client: Arc<dyn LLMClient>) -> Self {
        Self {
            planner: client.clone(),
            plan_schema: client.clone(),
            search_query: client.clone(),
            topics: client.clone(),
            section_writer: client.clone(),
            plain_writer: client,
        }
    }

    /// Build the per-step clients named in `[workflow]`.
    ///
    /// Steps sharing a model share one client instance.
    pub fn from_config(config: &ResearcherConfig) -> Result<Self> {
        let registry = ProviderRegistry::from_config(config);
        let mut built: HashMap<String, Arc<dyn LLMClient>> = HashMap::new();
        let mut resolve = |model: &str| -> Result<Arc<dyn LLMClient>> {
            if let Some(client) = built.get(model) {
                return Ok(client.clone());
            }
            let client = registry.create_client_for_model(model)?;
            tracing::debug!(model, model_id = client.model_name(), "Created LLM client");
            built.insert(model.to_string(), client.clone());
            Ok(client)
        };

        let workflow = &config.workflow;
        Ok(Self {
            planner: resolve(&workflow.planner)?,
            plan_schema: resolve(&workflow.plan_schema)?,
            search_query: resolve(&workflow.search_query)?,
            topics: resolve(&workflow.topics)?,
            section_writer: resolve(&workflow.section_writer)?,
            plain_writer: resolve(&workflow.plain_writer)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama() -> ProviderConfig {
        ProviderConfig::Ollama {
            base_url: "http://localhost:11434".to_string(),
        }
    }

    fn model(provider: &str, id: &str) -> ModelConfig {
        ModelConfig {
            provider: provider.to_string(),
            model: id.to_string(),
            temperature: 0.0,
            max_tokens: 2048,
            max_retries: 2,
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = ProviderRegistry::new();
        assert!(registry.model_names().is_empty());
        assert!(!registry.has_model("default"));
    }

    #[test]
    fn test_register_model() {
        let mut registry = ProviderRegistry::new();
        registry.register_provider("local", ollama());
        registry.register_model("fast", model("local", "llama3.2:1b"));
        registry.register_model("default", model("local", "llama3.1"));

        assert!(registry.has_model("fast"));
        assert_eq!(registry.model_names(), vec!["default", "fast"]);
    }

    #[test]
    fn test_missing_model_is_configuration_error() {
        let registry = ProviderRegistry::new();
        let err = registry.provider_for_model("ghost").unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_missing_provider_is_configuration_error() {
        let mut registry = ProviderRegistry::new();
        registry.register_model("default", model("nowhere", "llama3.1"));
        let err = registry.provider_for_model("default").unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_provider_for_model_resolves_chain() {
        let mut registry = ProviderRegistry::new();
        registry.register_provider("local", ollama());
        registry.register_model("default", model("local", "qwen2.5"));

        match registry.provider_for_model("default").unwrap() {
            Provider::Ollama { model, params, .. } => {
                assert_eq!(model, "qwen2.5");
                assert_eq!(params.max_retries, 2);
            }
            other => panic!("Expected Ollama provider, got {:?}", other),
        }
    }

    #[cfg(feature = "ollama")]
    #[test]
    fn test_step_clients_share_instances_per_model() {
        let config = ResearcherConfig::parse(
            r#"
[providers.local]
type = "ollama"

[models.default]
provider = "local"
model = "llama3.1"

[models.strict]
provider = "local"
model = "qwen2.5"

[workflow]
plan_schema = "strict"
topics = "strict"
"#,
        )
        .unwrap();

        let clients = StepClients::from_config(&config).unwrap();
        assert_eq!(clients.planner.model_name(), "llama3.1");
        assert_eq!(clients.plan_schema.model_name(), "qwen2.5");
        assert!(Arc::ptr_eq(&clients.plan_schema, &clients.topics));
        assert!(Arc::ptr_eq(&clients.planner, &clients.plain_writer));
    }
}
