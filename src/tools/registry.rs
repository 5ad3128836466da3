use crate::tools::{arxiv::ArxivSearch, web::WebSearch, wikipedia::WikipediaSearch};
use crate::types::{AppError, Result, SearchEngine, SearchResult, ToolDefinition};
use crate::utils::toml_config::SearchConfig;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A search backend the language model can call by name
#[async_trait]
pub trait SearchTool: Send + Sync {
    fn engine(&self) -> SearchEngine;
    fn description(&self) -> &str;

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.engine().tool_name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }

    /// Run one query. An empty list is a valid answer.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

struct Registered {
    tool: Arc<dyn SearchTool>,
    timeout: Duration,
}

/// Enabled search backends, keyed by engine
pub struct SearchToolRegistry {
    tools: BTreeMap<SearchEngine, Registered>,
}

impl Default for SearchToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Build the registry for every backend enabled in `[search]`
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("deep-researcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let mut registry = Self::new();

        if config.wikipedia.enabled {
            registry.register_with_timeout(
                Arc::new(WikipediaSearch::from_config(http.clone(), &config.wikipedia)),
                Duration::from_secs(config.wikipedia.timeout_secs),
            );
        }
        if config.web.enabled {
            registry.register_with_timeout(
                Arc::new(WebSearch::from_config(http.clone(), &config.web)?),
                Duration::from_secs(config.web.timeout_secs),
            );
        }
        if config.arxiv.enabled {
            registry.register_with_timeout(
                Arc::new(ArxivSearch::from_config(http, &config.arxiv)),
                Duration::from_secs(config.arxiv.timeout_secs),
            );
        }

        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn SearchTool>) {
        self.register_with_timeout(tool, DEFAULT_TIMEOUT);
    }

    pub fn register_with_timeout(&mut self, tool: Arc<dyn SearchTool>, timeout: Duration) {
        self.tools.insert(tool.engine(), Registered { tool, timeout });
    }

    /// Tool schemas offered to the language model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|r| r.tool.definition()).collect()
    }

    pub fn engines(&self) -> Vec<SearchEngine> {
        self.tools.keys().copied().collect()
    }

    pub fn has_engine(&self, engine: SearchEngine) -> bool {
        self.tools.contains_key(&engine)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute one search.
    ///
    /// Every failure, including a timeout or an unregistered engine, comes back
    /// as [`AppError::ToolInvocation`].
    pub async fn invoke(&self, engine: SearchEngine, query: &str) -> Result<Vec<SearchResult>> {
        let tool_name = engine.tool_name();
        let registered = self
            .tools
            .get(&engine)
            .ok_or_else(|| AppError::tool(tool_name, "search backend is not enabled"))?;

        match tokio::time::timeout(registered.timeout, registered.tool.search(query)).await {
            Ok(Ok(results)) => Ok(results),
            Ok(Err(e @ AppError::ToolInvocation { .. })) => Err(e),
            Ok(Err(e)) => Err(AppError::tool(tool_name, e)),
            Err(_) => Err(AppError::tool(
                tool_name,
                format!("timed out after {}s", registered.timeout.as_secs_f32()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowTool;

    #[async_trait]
    impl SearchTool for SlowTool {
        fn engine(&self) -> SearchEngine {
            SearchEngine::Academic
        }

        fn description(&self) -> &str {
            "Never answers in time"
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl SearchTool for BrokenTool {
        fn engine(&self) -> SearchEngine {
            SearchEngine::Wiki
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
            Err(AppError::Internal("connection reset".to_string()))
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = SearchToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.definitions().is_empty());
    }

    #[test]
    fn test_definitions_use_tool_names() {
        let mut registry = SearchToolRegistry::new();
        registry.register(Arc::new(SlowTool));
        registry.register(Arc::new(BrokenTool));

        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["search_wikipedia", "search_arxiv"]);
        for def in registry.definitions() {
            assert_eq!(def.parameters["required"][0], "query");
        }
    }

    #[tokio::test]
    async fn test_unregistered_engine_is_tool_error() {
        let registry = SearchToolRegistry::new();
        let err = registry.invoke(SearchEngine::Web, "rust").await.unwrap_err();
        assert!(matches!(err, AppError::ToolInvocation { ref tool, .. } if tool == "search_web"));
    }

    #[tokio::test]
    async fn test_backend_error_is_wrapped() {
        let mut registry = SearchToolRegistry::new();
        registry.register(Arc::new(BrokenTool));
        let err = registry.invoke(SearchEngine::Wiki, "rust").await.unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_timeout_is_tool_error() {
        let mut registry = SearchToolRegistry::new();
        registry.register_with_timeout(Arc::new(SlowTool), Duration::from_millis(20));
        let err = registry.invoke(SearchEngine::Academic, "rust").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_from_config_respects_enabled_flags() {
        let mut config = SearchConfig::default();
        config.arxiv.enabled = false;
        let registry = SearchToolRegistry::from_config(&config).unwrap();
        assert_eq!(registry.engines(), vec![SearchEngine::Wiki, SearchEngine::Web]);
    }
}
