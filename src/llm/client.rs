//! LLM Client abstractions and provider management
//!
//! This module provides a unified interface for the language models that drive
//! each workflow step:
//! - **OpenAI**: OpenAI API and compatible endpoints, native tool calling
//! - **Ollama**: local inference, tool selection through a JSON protocol

use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use crate::utils::toml_config::{ModelConfig, ProviderConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing workflow code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate with tool calling support
    async fn generate_with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;

    /// Inference parameters this client was built with
    fn params(&self) -> &ModelParams;
}

/// Response from an LLM generation request
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
}

/// Per-model inference parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Extra attempts after the first failed call
    pub max_retries: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            temperature: None,
            max_tokens: None,
            max_retries: 2,
        }
    }
}

impl From<&ModelConfig> for ModelParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            max_retries: config.max_retries,
        }
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including compatible APIs such as Groq or OpenRouter)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4o".to_string(),
    ///     params: ModelParams::default(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        params: ModelParams,
    },

    /// Ollama local LLM provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Ollama {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     model: "llama3.1".to_string(),
    ///     params: ModelParams::default(),
    /// };
    /// ```
    Ollama {
        base_url: String,
        model: String,
        params: ModelParams,
    },
}

impl Provider {
    /// Resolve a model configuration against its provider configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider needs an API key whose
    /// environment variable is not set.
    pub fn from_model_config(model: &ModelConfig, provider: &ProviderConfig) -> Result<Self> {
        let params = ModelParams::from(model);
        match provider {
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
            } => {
                let api_key = std::env::var(api_key_env).map_err(|_| {
                    AppError::Configuration(format!(
                        "Environment variable '{}' for provider '{}' is not set",
                        api_key_env, model.provider
                    ))
                })?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.model.clone(),
                    params,
                })
            }
            ProviderConfig::Ollama { base_url } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.model.clone(),
                params,
            }),
        }
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the crate was built without the provider's feature.
    pub fn create_client(&self) -> Result<Arc<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                params,
            } => Ok(Arc::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                params.clone(),
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                model,
                params,
            } => Ok(Arc::new(super::ollama::OllamaClient::new(
                base_url,
                model.clone(),
                params.clone(),
            ))),

            #[allow(unreachable_patterns)]
            other => Err(AppError::Configuration(format!(
                "{} provider requested but deep-researcher was built without the '{}' feature",
                other.name(),
                other.feature()
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    fn feature(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "openai",
            Provider::Ollama { .. } => "ollama",
        }
    }

    /// Check if this provider was compiled in
    pub fn is_enabled(&self) -> bool {
        match self {
            Provider::OpenAI { .. } => cfg!(feature = "openai"),
            Provider::Ollama { .. } => cfg!(feature = "ollama"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(provider: &str) -> ModelConfig {
        ModelConfig {
            provider: provider.to_string(),
            model: "test-model".to_string(),
            temperature: 0.2,
            max_tokens: 2048,
            max_retries: 3,
        }
    }

    #[test]
    fn test_params_from_model_config() {
        let params = ModelParams::from(&model("local"));
        assert_eq!(params.temperature, Some(0.2));
        assert_eq!(params.max_tokens, Some(2048));
        assert_eq!(params.max_retries, 3);
    }

    #[test]
    fn test_ollama_from_model_config() {
        let provider = Provider::from_model_config(
            &model("local"),
            &ProviderConfig::Ollama {
                base_url: "http://localhost:11434".to_string(),
            },
        )
        .unwrap();
        assert_eq!(provider.name(), "Ollama");
        match provider {
            Provider::Ollama { model, .. } => assert_eq!(model, "test-model"),
            _ => panic!("Expected Ollama provider"),
        }
    }

    #[test]
    fn test_openai_missing_key_is_configuration_error() {
        let result = Provider::from_model_config(
            &model("cloud"),
            &ProviderConfig::OpenAI {
                api_key_env: "DEEP_RESEARCHER_TEST_UNSET_KEY".to_string(),
                api_base: "https://api.openai.com/v1".to_string(),
            },
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("DEEP_RESEARCHER_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_disabled_provider_reports_feature() {
        let provider = Provider::OpenAI {
            api_key: "test".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            params: ModelParams::default(),
        };
        if provider.is_enabled() {
            return;
        }
        let err = match provider.create_client() {
            Ok(_) => panic!("Expected error"),
            Err(e) => e.to_string(),
        };
        assert!(err.contains("'openai' feature"));
    }
}
