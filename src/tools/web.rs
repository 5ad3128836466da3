//! General web search
//!
//! DuckDuckGo through daedra needs no credentials and is the default. Tavily
//! is used when `search.web.provider = "tavily"`, reading its key from the
//! configured environment variable.

use crate::tools::normalize_content;
use crate::tools::registry::SearchTool;
use crate::types::{AppError, Result, SearchEngine, SearchResult};
use crate::utils::toml_config::{WebProvider, WebSearchConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com/search";
const DEFAULT_MAX_RESULTS: usize = 2;

enum Backend {
    DuckDuckGo,
    Tavily {
        http: reqwest::Client,
        api_url: String,
        api_key: String,
    },
}

pub struct WebSearch {
    backend: Backend,
    max_results: usize,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl WebSearch {
    /// DuckDuckGo search via daedra
    pub fn duckduckgo(max_results: usize) -> Self {
        Self {
            backend: Backend::DuckDuckGo,
            max_results,
        }
    }

    pub fn tavily(
        http: reqwest::Client,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        max_results: usize,
    ) -> Self {
        Self {
            backend: Backend::Tavily {
                http,
                api_url: api_url.into(),
                api_key: api_key.into(),
            },
            max_results,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &WebSearchConfig) -> Result<Self> {
        let max_results = config.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        match config.provider {
            WebProvider::DuckDuckGo => Ok(Self::duckduckgo(max_results)),
            WebProvider::Tavily => {
                let api_key = std::env::var(&config.tavily_api_key_env).map_err(|_| {
                    AppError::Configuration(format!(
                        "Environment variable '{}' for Tavily search is not set",
                        config.tavily_api_key_env
                    ))
                })?;
                let api_url = config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TAVILY_URL.to_string());
                Ok(Self::tavily(http, api_url, api_key, max_results))
            }
        }
    }

    async fn search_duckduckgo(&self, query: &str) -> Result<Vec<SearchResult>> {
        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: self.max_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| AppError::tool(self.engine().tool_name(), e))?;

        Ok(response
            .data
            .into_iter()
            .take(self.max_results)
            .map(|hit| SearchResult {
                search_query: query.to_string(),
                title: hit.title,
                source: hit.url,
                content: normalize_content(&hit.description),
                search_engine: SearchEngine::Web,
            })
            .collect())
    }

    async fn search_tavily(
        &self,
        http: &reqwest::Client,
        api_url: &str,
        api_key: &str,
        query: &str,
    ) -> Result<Vec<SearchResult>> {
        let tool = self.engine().tool_name();
        let response = http
            .post(api_url)
            .bearer_auth(api_key)
            .json(&TavilyRequest {
                query,
                max_results: self.max_results,
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::tool(tool, e))?;

        let body: TavilyResponse = response.json().await.map_err(|e| AppError::tool(tool, e))?;

        Ok(body
            .results
            .into_iter()
            .take(self.max_results)
            .map(|hit| SearchResult {
                search_query: query.to_string(),
                title: hit.title,
                source: hit.url,
                content: normalize_content(&hit.content),
                search_engine: SearchEngine::Web,
            })
            .collect())
    }
}

#[async_trait]
impl SearchTool for WebSearch {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Web
    }

    fn description(&self) -> &str {
        "Search the web for the given query. Best for real-time information, news and \
         domain-specific content."
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        match &self.backend {
            Backend::DuckDuckGo => self.search_duckduckgo(query).await,
            Backend::Tavily {
                http,
                api_url,
                api_key,
            } => self.search_tavily(http, api_url, api_key, query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_duckduckgo() {
        let search = WebSearch::from_config(reqwest::Client::new(), &WebSearchConfig::default()).unwrap();
        assert!(matches!(search.backend, Backend::DuckDuckGo));
        assert_eq!(search.max_results, 2);
    }

    #[test]
    fn test_tavily_requires_key() {
        let config = WebSearchConfig {
            provider: WebProvider::Tavily,
            tavily_api_key_env: "DEEP_RESEARCHER_TEST_NO_TAVILY".to_string(),
            ..Default::default()
        };
        let err = match WebSearch::from_config(reqwest::Client::new(), &config) {
            Ok(_) => panic!("Expected configuration error"),
            Err(e) => e,
        };
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
